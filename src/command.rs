//! Line-oriented command front end
//!
//! [`Controller`] ties the registry, the machine it configures and the
//! persisted store together. Each text line is one request:
//!
//! ```text
//! $            show the system group
//! $$           show everything
//! $xvm         show one parameter or group
//! $xvm=1200    set a parameter (also `$xvm 1200`, `$xvm:1200`)
//! g0 x10       anything else is handed to the `gc` entry
//! ```
//!
//! Successful sets of persisted entries are written to Flash before the
//! response is rendered.

use gantry_core::nv::{
    JsonFormat, NvList, NvValue, Registry, Responder, Response, SetOp, TextFormat, NV_STRING_LEN,
};
use gantry_core::{Capabilities, Machine, Status, TableError};
use heapless::String;

use crate::config::build_capabilities;
use crate::core::parameters::{LoadOutcome, NvStore, PersistError};
use crate::platform::FlashInterface;
use crate::{log_error, log_warn};

/// Token shown for a bare `$`
const SYSTEM_GROUP: &str = "sys";

/// Token receiving lines that are not `$` commands
const GCODE_TOKEN: &str = "gc";

/// Characters separating a token from its value
const SEPARATORS: [char; 4] = ['=', ':', ' ', '\t'];

/// Registry, machine and persistence behind one command stream
pub struct Controller<F: FlashInterface> {
    registry: Registry,
    machine: Machine,
    store: NvStore<F>,
}

impl<F: FlashInterface> Controller<F> {
    /// Build the registry for `caps` over a fresh machine
    ///
    /// Call [`init`](Self::init) before handling commands.
    pub fn new(caps: Capabilities, store: NvStore<F>) -> Result<Self, TableError> {
        Ok(Self {
            registry: Registry::new(caps)?,
            machine: Machine::default(),
            store,
        })
    }

    /// Controller for the capability set selected at build time
    ///
    /// See [`build_capabilities`].
    pub fn from_build(store: NvStore<F>) -> Result<Self, TableError> {
        Self::new(build_capabilities()?, store)
    }

    /// Load persisted values, or factory defaults on first start
    pub fn init(&mut self) -> Result<LoadOutcome, PersistError> {
        self.store.init(&self.registry, &mut self.machine)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn store_mut(&mut self) -> &mut NvStore<F> {
        &mut self.store
    }

    /// Run one text command and render its result through `responder`
    pub fn handle_text(&mut self, line: &str, responder: &mut dyn Responder) -> Status {
        let line = line.trim();
        if line.is_empty() {
            return Status::Noop;
        }

        let (token, value) = match line.strip_prefix('$') {
            Some("") => (SYSTEM_GROUP, None),
            Some(command) => split_command(command),
            None => (GCODE_TOKEN, Some(line)),
        };

        let mut lowered: String<NV_STRING_LEN> = String::new();
        for c in token.chars() {
            if lowered.push(c.to_ascii_lowercase()).is_err() {
                break;
            }
        }
        let mut list = NvList::with_token("", &lowered);

        let status = match value {
            None => self.get(&mut list, responder),
            Some(text) => match parse_value(text) {
                Ok(value) => {
                    if let Some(nv) = list.first_mut() {
                        nv.value = value;
                    }
                    self.set(&mut list)
                }
                Err(status) => status,
            },
        };

        if status == Status::Truncated {
            log_warn!("Response to {} truncated", lowered.as_str());
        }
        // uber-groups render their own members as they go
        if status != Status::Complete {
            respond(&self.registry, &self.machine, status, &list, responder);
        }
        status
    }

    fn get(&mut self, list: &mut NvList, responder: &mut dyn Responder) -> Status {
        self.registry.get(list, &mut self.machine, responder)
    }

    fn set(&mut self, list: &mut NvList) -> Status {
        let status = self.registry.set(list, &mut self.machine);
        if status.is_error() || status == Status::Noop {
            return status;
        }

        let single = list
            .first()
            .and_then(|nv| nv.index)
            .filter(|&index| {
                self.registry.boundaries().is_single(index)
                    && self.registry.descriptor(index).is_some_and(|desc| {
                        !matches!(desc.set, SetOp::Defaults | SetOp::StatusReport)
                    })
            });
        let staged = match single {
            Some(index) => self
                .store
                .persist(&self.registry, &mut self.machine, index)
                .map(|_| ()),
            None => self.store.persist_all(&self.registry, &mut self.machine),
        };
        if let Err(e) = staged.and_then(|_| self.store.flush().map(|_| ())) {
            log_error!("Parameter save failed: {}", persist_error_code(e));
        }
        status
    }
}

fn respond(
    registry: &Registry,
    machine: &Machine,
    status: Status,
    list: &NvList,
    responder: &mut dyn Responder,
) {
    responder.respond(&Response {
        status,
        list,
        registry,
        units: machine.units_mode(),
        text_format: TextFormat::MultilineFormatted,
        json_format: JsonFormat::Response,
    });
}

/// Split `token=value` into its parts; a bare token is a read
fn split_command(command: &str) -> (&str, Option<&str>) {
    match command.find(SEPARATORS) {
        Some(at) => {
            let (token, rest) = command.split_at(at);
            let value = rest[1..].trim_start_matches(SEPARATORS).trim();
            (token, (!value.is_empty()).then_some(value))
        }
        None => (command, None),
    }
}

/// Integers stay integers so byte and word entries keep exact values
fn parse_value(text: &str) -> Result<NvValue, Status> {
    if let Ok(v) = text.parse::<i64>() {
        return Ok(NvValue::Int(v));
    }
    if let Ok(v) = text.parse::<f32>() {
        return Ok(NvValue::Float(v));
    }
    match text {
        "t" | "true" => Ok(NvValue::Int(1)),
        "f" | "false" => Ok(NvValue::Int(0)),
        _ => String::try_from(text)
            .map(NvValue::Str)
            .map_err(|_| Status::BufferFull),
    }
}

/// Numeric tag for a persistence failure, usable by every log backend
fn persist_error_code(e: PersistError) -> u8 {
    match e {
        PersistError::Platform(_) => 1,
        PersistError::ImageFull => 2,
        PersistError::Defaults(status) => status.code(),
    }
}
