//! Gamepad axis resampling.
//!
//! Analog sticks can emit thousands of events per second, far more than the
//! device (or the AOA queue) cares to see. This decorator coalesces axis
//! events per gamepad: each slot keeps only the latest value per axis and a
//! flush deadline; a worker forwards the coalesced values when the deadline
//! expires. Device and button events pass through immediately, they must
//! never be dropped.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

use hid::MAX_GAMEPADS;
use input_events::{
    GamepadAxis, GamepadAxisEvent, GamepadButtonEvent, GamepadDeviceAction, GamepadDeviceEvent,
    GAMEPAD_ID_INVALID,
};
use tick::Tick;

use crate::GamepadProcessor;

/// Default flush cadence.
pub const DEFAULT_MIN_INTERVAL: Tick = Tick::from_ms(4);

const AXES: usize = 6;

fn axis_index(axis: GamepadAxis) -> usize {
    match axis {
        GamepadAxis::LeftX => 0,
        GamepadAxis::LeftY => 1,
        GamepadAxis::RightX => 2,
        GamepadAxis::RightY => 3,
        GamepadAxis::LeftTrigger => 4,
        GamepadAxis::RightTrigger => 5,
    }
}

fn axis_from_index(index: usize) -> GamepadAxis {
    match index {
        0 => GamepadAxis::LeftX,
        1 => GamepadAxis::LeftY,
        2 => GamepadAxis::RightX,
        3 => GamepadAxis::RightY,
        4 => GamepadAxis::LeftTrigger,
        _ => GamepadAxis::RightTrigger,
    }
}

#[derive(Copy, Clone)]
struct Slot {
    gamepad_id: u32,
    pending: [Option<i16>; AXES],
    deadline: Option<Tick>,
}

impl Slot {
    fn free() -> Slot {
        Slot { gamepad_id: GAMEPAD_ID_INVALID, pending: [None; AXES], deadline: None }
    }
}

struct State {
    slots: [Slot; MAX_GAMEPADS],
    stopped: bool,
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

pub struct GamepadResampler {
    shared: Arc<Shared>,
    delegate: Arc<Mutex<Box<dyn GamepadProcessor>>>,
    min_interval: Tick,
    thread: Option<JoinHandle<()>>,
}

impl GamepadResampler {
    pub fn new(delegate: Box<dyn GamepadProcessor>, min_interval: Tick) -> GamepadResampler {
        assert!(min_interval > Tick::ZERO);
        let shared = Arc::new(Shared {
            state: Mutex::new(State { slots: [Slot::free(); MAX_GAMEPADS], stopped: false }),
            cond: Condvar::new(),
        });
        let delegate = Arc::new(Mutex::new(delegate));

        let thread = thread::Builder::new()
            .name("gamepad-resampler".into())
            .spawn({
                let shared = Arc::clone(&shared);
                let delegate = Arc::clone(&delegate);
                move || run_resampler(shared, delegate)
            })
            .expect("could not spawn gamepad resampler thread");

        GamepadResampler { shared, delegate, min_interval, thread: Some(thread) }
    }

    pub fn stop(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.stopped = true;
        self.shared.cond.notify_all();
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }

    fn find_slot(slots: &mut [Slot; MAX_GAMEPADS], gamepad_id: u32) -> Option<&mut Slot> {
        slots.iter_mut().find(|slot| slot.gamepad_id == gamepad_id)
    }
}

impl Drop for GamepadResampler {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl GamepadProcessor for GamepadResampler {
    fn process_gamepad_device(&mut self, event: &GamepadDeviceEvent) {
        {
            let mut state = self.shared.state.lock().unwrap();
            match event.action {
                GamepadDeviceAction::Added => {
                    if let Some(slot) = Self::find_slot(&mut state.slots, GAMEPAD_ID_INVALID) {
                        slot.gamepad_id = event.gamepad_id;
                        slot.pending = [None; AXES];
                        slot.deadline = None;
                    }
                }
                GamepadDeviceAction::Removed => {
                    // Pending axis values for a removed gamepad are moot.
                    if let Some(slot) = Self::find_slot(&mut state.slots, event.gamepad_id) {
                        *slot = Slot::free();
                    }
                }
            }
        }
        self.delegate.lock().unwrap().process_gamepad_device(event);
    }

    fn process_gamepad_axis(&mut self, event: &GamepadAxisEvent) {
        let mut state = self.shared.state.lock().unwrap();
        let Some(slot) = Self::find_slot(&mut state.slots, event.gamepad_id) else {
            return; // unknown gamepad
        };
        slot.pending[axis_index(event.axis)] = Some(event.value);
        if slot.deadline.is_none() {
            slot.deadline = Some(Tick::now() + self.min_interval);
            self.shared.cond.notify_all();
        }
    }

    fn process_gamepad_button(&mut self, event: &GamepadButtonEvent) {
        // Buttons must not be coalesced or delayed behind axis flushes.
        self.delegate.lock().unwrap().process_gamepad_button(event);
    }
}

fn run_resampler(shared: Arc<Shared>, delegate: Arc<Mutex<Box<dyn GamepadProcessor>>>) {
    log::debug!("gamepad resampler thread started");
    loop {
        let flushes = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if state.stopped {
                    log::debug!("gamepad resampler thread ended");
                    return;
                }

                let earliest = state.slots.iter().filter_map(|slot| slot.deadline).min();
                match earliest {
                    None => {
                        state = shared.cond.wait(state).unwrap();
                    }
                    Some(deadline) => {
                        let remaining = deadline.remaining();
                        if remaining.is_zero() {
                            break;
                        }
                        let (guard, _) = shared.cond.wait_timeout(state, remaining).unwrap();
                        state = guard;
                    }
                }
            }

            let now = Tick::now();
            let mut flushes = Vec::new();
            for slot in state.slots.iter_mut() {
                if slot.gamepad_id == GAMEPAD_ID_INVALID {
                    continue;
                }
                if slot.deadline.is_some_and(|deadline| deadline <= now) {
                    for (index, value) in slot.pending.iter_mut().enumerate() {
                        if let Some(value) = value.take() {
                            flushes.push(GamepadAxisEvent {
                                gamepad_id: slot.gamepad_id,
                                axis: axis_from_index(index),
                                value,
                            });
                        }
                    }
                    slot.deadline = None;
                }
            }
            flushes
        };

        // Deliver outside the state lock.
        let mut delegate = delegate.lock().unwrap();
        for event in &flushes {
            delegate.process_gamepad_axis(event);
        }
    }
}
