//! Digital input configuration

use super::Cell;

/// Input channels addressable by the table
pub const INPUTS: usize = 9;

/// Input disabled
pub const IO_MODE_DISABLED: i8 = -1;
/// Highest accepted mode (0 = active low, 1 = active high)
pub const IO_MODE_MAX: i8 = 1;
/// Highest action (none, stop, fast stop, halt, panic, reset)
pub const IO_ACTION_MAX: u8 = 5;
/// Highest function (none, limit, interlock, shutdown, probe)
pub const IO_FUNCTION_MAX: u8 = 4;

const DEFAULT_MODE: i8 = 1;
const DEFAULT_ACTION: u8 = 0;
const FUNCTION_LIMIT: u8 = 1;

/// Addressable input fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Mode,
    Action,
    Function,
    State,
}

/// One digital input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalInput {
    pub mode: i8,
    pub action: u8,
    pub function: u8,
    /// Live, debounced state maintained by the input scanner
    pub state: u8,
}

impl DigitalInput {
    /// Factory settings for a zero-based channel
    ///
    /// The first six channels are wired as limit switches.
    pub fn for_channel(channel: usize) -> Self {
        Self {
            mode: DEFAULT_MODE,
            action: DEFAULT_ACTION,
            function: if channel < 6 { FUNCTION_LIMIT } else { 0 },
            state: 0,
        }
    }

    pub fn cell(&mut self, field: InputField) -> Cell<'_> {
        match field {
            InputField::Mode => Cell::Int8(&mut self.mode),
            InputField::Action => Cell::Byte(&mut self.action),
            InputField::Function => Cell::Byte(&mut self.function),
            InputField::State => Cell::Byte(&mut self.state),
        }
    }
}
