/// Gamepad input tracker using gilrs.
///
/// gilrs events are translated into `PadEvent`s and folded into
/// per-button held / just-pressed state, so the mapping logic can be
/// exercised without a device.
///
/// Default mapping (see `[gamepad]` in config.toml):
///   D-pad / Left Stick   →  Move (one cell per press)
///   L1 / R1 (held)       →  Dig-only modifier
///   Select               →  Pause
///   Y                    →  Restart
///   Start / A            →  Confirm
///   B                    →  Cancel

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical face/shoulder button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East  => Some(Btn::B),
            Button::West  => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger   => Some(Btn::L1),
            Button::RightTrigger  => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Configurable actions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    DigOnly,
    Pause,
    Restart,
    Confirm,
    Cancel,
}

/// Device-independent input fed into `GamepadState::apply`.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PadEvent {
    Button(Btn, bool),
    DPad(Direction, bool),
    StickX(f32),
    /// Positive is up.
    StickY(f32),
    Disconnected,
}

#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

struct ActionMap {
    dig_only: Vec<Btn>,
    pause: Vec<Btn>,
    restart: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            dig_only: vec![Btn::L1, Btn::R1],
            pause:    vec![Btn::Select],
            restart:  vec![Btn::Y],
            confirm:  vec![Btn::Start, Btn::A],
            cancel:   vec![Btn::B],
        }
    }
}

impl ActionMap {
    fn buttons(&self, action: Action) -> &[Btn] {
        match action {
            Action::DigOnly => &self.dig_only,
            Action::Pause => &self.pause,
            Action::Restart => &self.restart,
            Action::Confirm => &self.confirm,
            Action::Cancel => &self.cancel,
        }
    }
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::debug!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Apply the `[gamepad]` config. Lists naming no known button keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_into(names: &[String], slot: &mut Vec<Btn>) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() {
                log::warn!("gamepad mapping {names:?} names no known button, keeping default");
            } else {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        parse_into(&cfg.dig_only, &mut map.dig_only);
        parse_into(&cfg.pause, &mut map.pause);
        parse_into(&cfg.restart, &mut map.restart);
        parse_into(&cfg.confirm, &mut map.confirm);
        parse_into(&cfg.cancel, &mut map.cancel);
    }

    /// Start a new frame: clear edges, then drain the device.
    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };

        let mut events = Vec::new();
        while let Some(ev) = gilrs.next_event() {
            let pad = match ev.event {
                EventType::ButtonPressed(b, _) => translate_button(b, true),
                EventType::ButtonReleased(b, _) => translate_button(b, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => Some(PadEvent::StickX(v)),
                EventType::AxisChanged(Axis::LeftStickY, v, _) => Some(PadEvent::StickY(v)),
                EventType::Connected => {
                    self.connected = true;
                    None
                }
                EventType::Disconnected => Some(PadEvent::Disconnected),
                _ => None,
            };
            events.extend(pad);
        }

        for ev in events {
            self.apply(ev);
        }
    }

    /// Fold one event into the state.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    pub fn apply(&mut self, event: PadEvent) {
        match event {
            PadEvent::Button(btn, held) => self.buttons[btn as usize].set(held),
            PadEvent::DPad(dir, held) => self.dpad[dir_index(dir)].set(held),
            PadEvent::StickX(v) => self.stick_x = v,
            PadEvent::StickY(v) => self.stick_y = v,
            PadEvent::Disconnected => {
                self.connected = false;
                self.release_all();
                return;
            }
        }
        self.connected = true;
        self.derive_stick();
    }

    // ── Queries ──

    /// Direction freshly pressed this frame (d-pad first, then stick).
    pub fn direction_pressed(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].just_pressed || self.stick[i].just_pressed
        })
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.action_map.buttons(action).iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn held(&self, action: Action) -> bool {
        self.action_map.buttons(action).iter().any(|&b| self.buttons[b as usize].held)
    }

    // ── Internal ──

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn derive_stick(&mut self) {
        let (x, y) = (self.stick_x, self.stick_y);
        self.stick[dir_index(Direction::Left)].set(x < -STICK_DEADZONE);
        self.stick[dir_index(Direction::Right)].set(x > STICK_DEADZONE);
        self.stick[dir_index(Direction::Up)].set(y > STICK_DEADZONE);
        self.stick[dir_index(Direction::Down)].set(y < -STICK_DEADZONE);
    }

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(feature = "gamepad")]
fn translate_button(btn: Button, held: bool) -> Option<PadEvent> {
    let dir = match btn {
        Button::DPadUp => Some(Direction::Up),
        Button::DPadDown => Some(Direction::Down),
        Button::DPadLeft => Some(Direction::Left),
        Button::DPadRight => Some(Direction::Right),
        _ => None,
    };
    match dir {
        Some(d) => Some(PadEvent::DPad(d, held)),
        None => Btn::from_gilrs(btn).map(|b| PadEvent::Button(b, held)),
    }
}
