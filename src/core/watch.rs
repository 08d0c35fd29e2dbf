//! Foreground loop for `pomodash watch`.
//!
//! The loop is single threaded with respect to the engine: a helper thread
//! only forwards stdin lines over a channel, and every engine call happens
//! here between waits.

use crate::core::clock::Clock;
use crate::core::engine::{TimerEngine, TimerStore, Transition};
use crate::errors::AppError;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    Pause,
    Resume,
    Skip,
    Stop,
    /// Leave the loop; the checkpoint keeps the timer alive.
    Quit,
}

impl WatchCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "k" | "skip" => Some(Self::Skip),
            "s" | "stop" => Some(Self::Stop),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Something worth showing to the user.
#[derive(Debug)]
pub enum WatchEvent {
    /// Result of a periodic tick.
    Tick(Transition),
    /// A command was applied.
    Applied(WatchCommand, Transition),
    /// A command was refused by the engine.
    Rejected(WatchCommand, AppError),
    /// Input that is not a known command.
    Unknown(String),
    /// Non-fatal storage problem.
    Warning(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The timer went back to idle.
    Finished,
    /// The user quit while the timer was still active.
    Detached,
}

/// Forward stdin lines to the returned channel. The sender is dropped at EOF.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Tick the engine every `interval` and apply commands from `input` until
/// the timer goes idle or the user quits.
pub fn run_loop<S, C, F>(
    engine: &mut TimerEngine<'_, S, C>,
    input: &Receiver<String>,
    interval: Duration,
    mut on_event: F,
) -> WatchExit
where
    S: TimerStore + ?Sized,
    C: Clock + ?Sized,
    F: FnMut(WatchEvent),
{
    let mut input_open = true;

    loop {
        match engine.tick() {
            Ok(t) => on_event(WatchEvent::Tick(t)),
            Err(e) => on_event(WatchEvent::Warning(e.to_string())),
        }
        flush_warnings(engine, &mut on_event);

        if engine.is_idle() {
            return WatchExit::Finished;
        }

        let line = if input_open {
            match input.recv_timeout(interval) {
                Ok(line) => Some(line),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    input_open = false;
                    None
                }
            }
        } else {
            thread::sleep(interval);
            None
        };

        let Some(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }

        let Some(cmd) = WatchCommand::parse(&line) else {
            on_event(WatchEvent::Unknown(line));
            continue;
        };

        let result = match cmd {
            WatchCommand::Quit => return WatchExit::Detached,
            WatchCommand::Pause => engine.pause(),
            WatchCommand::Resume => engine.resume(),
            WatchCommand::Skip => engine.skip_to_break(),
            WatchCommand::Stop => engine.stop(),
        };

        match result {
            Ok(t) => on_event(WatchEvent::Applied(cmd, t)),
            Err(e) => on_event(WatchEvent::Rejected(cmd, e)),
        }
        flush_warnings(engine, &mut on_event);

        if engine.is_idle() {
            return WatchExit::Finished;
        }
    }
}

fn flush_warnings<S, C, F>(engine: &mut TimerEngine<'_, S, C>, on_event: &mut F)
where
    S: TimerStore + ?Sized,
    C: Clock + ?Sized,
    F: FnMut(WatchEvent),
{
    for w in engine.take_warnings() {
        on_event(WatchEvent::Warning(w));
    }
}
