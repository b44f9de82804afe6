//! Group and uber-group expansion
//!
//! A group get fills one list with every member of the group. List-driven
//! expansion renders one group at a time: each group is fetched into its own
//! list, handed to the responder, and dropped before the next one starts.

use super::descriptor::{NvFlags, UberGroup};
use super::object::{truncated, Group, NvList, NvValue};
use super::print::{JsonFormat, Responder, Response, TextFormat};
use super::registry::Registry;
use super::NV_MAX_OBJECTS;
use crate::capabilities::{MAX_INPUT_CHANNELS, MAX_MOTORS};
use crate::machine::Machine;
use crate::status::Status;

const MOTOR_GROUPS: [&str; MAX_MOTORS as usize] = ["1", "2", "3", "4", "5", "6"];

const AXIS_GROUPS: [&str; 7] = ["x", "y", "z", "a", "b", "c", ""];

const OFFSET_GROUPS: [&str; 10] = [
    "g54", "g55", "g56", "g57", "g58", "g59", "g92", "g28", "g30", "",
];

const INPUT_GROUPS: [&str; MAX_INPUT_CHANNELS as usize] =
    ["di1", "di2", "di3", "di4", "di5", "di6", "di7", "di8", "di9"];

/// Whether members of `group` carry the group name as a token prefix
///
/// `sr` and `sys` members are named on their own.
pub fn group_is_prefixed(group: &str) -> bool {
    !matches!(group, "sr" | "sys")
}

/// Fill the list with every member of the group named by its first object
///
/// Member tokens lose the group prefix unless the entry is flagged
/// [`NvFlags::NOSTRIP`].
pub fn get_group(registry: &Registry, list: &mut NvList, machine: &mut Machine) -> Status {
    let Some(parent) = list.first_mut() else {
        return Status::InternalError;
    };
    let group: Group = truncated(&parent.token);
    parent.value = NvValue::Parent;
    list.truncate_children();

    let prefixed = group_is_prefixed(&group);
    let singles = registry.boundaries().start_of_groups;
    for (index, desc) in registry.descriptors().take(singles as usize) {
        if desc.group != group {
            continue;
        }
        let mut nv = registry.object(index);
        if prefixed && !desc.flags.contains(NvFlags::NOSTRIP) {
            nv.set_token(desc.stripped_token());
        }
        nv.depth = 1;
        let status = registry.get_nv(&mut nv, machine);
        if status.is_error() {
            return status;
        }
        if list.push(nv).is_err() {
            return Status::BufferFull;
        }
    }
    Status::Ok
}

/// Apply each child of the list as a member of the parent group
///
/// Children may be named with or without the group prefix. Stops at the first
/// failure; earlier children stay applied.
pub fn set_group(registry: &Registry, list: &mut NvList, machine: &mut Machine) -> Status {
    let NvList { objects, messages } = list;
    let Some(parent) = objects.first() else {
        return Status::InternalError;
    };
    let group: Group = truncated(&parent.token);

    for child in objects.iter_mut().skip(1) {
        let index = registry.index_of(&group, &child.token).or_else(|| {
            registry
                .index_of("", &child.token)
                .filter(|&i| registry.descriptor(i).is_some_and(|d| d.group == group))
        });
        let Some(index) = index else {
            return Status::UnrecognizedName;
        };
        child.index = Some(index);
        let status = registry.set_nv(child, machine, messages);
        if status.is_error() {
            return status;
        }
    }
    Status::Ok
}

/// Fetch one group and hand it to the responder
fn render_group(
    registry: &Registry,
    token: &str,
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    let mut list = NvList::with_token("", token);
    let status = match registry.index_of("", token) {
        Some(index) => {
            if let Some(parent) = list.first_mut() {
                parent.index = Some(index);
            }
            get_group(registry, &mut list, machine)
        }
        None => Status::UnrecognizedName,
    };
    responder.respond(&Response {
        status,
        list: &list,
        registry,
        units: machine.units_mode(),
        text_format: TextFormat::MultilineFormatted,
        json_format: JsonFormat::Response,
    });
    status
}

/// Render each group named in `tokens`, in order
///
/// Stops with [`Status::Complete`] at an empty-string sentinel or the end of
/// the slice. Lists longer than [`NV_MAX_OBJECTS`] without a sentinel are cut
/// there and reported as [`Status::Truncated`]. A token that does not resolve
/// is rendered with its error and iteration continues.
pub fn do_group_list(
    registry: &Registry,
    tokens: &[&str],
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    for token in tokens.iter().take(NV_MAX_OBJECTS) {
        if token.is_empty() {
            return Status::Complete;
        }
        render_group(registry, token, machine, responder);
    }
    if tokens.len() > NV_MAX_OBJECTS {
        Status::Truncated
    } else {
        Status::Complete
    }
}

pub fn do_uber(
    registry: &Registry,
    uber: UberGroup,
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    match uber {
        UberGroup::Motors => do_motors(registry, machine, responder),
        UberGroup::Axes => do_axes(registry, machine, responder),
        UberGroup::Offsets => do_offsets(registry, machine, responder),
        UberGroup::Inputs => do_inputs(registry, machine, responder),
        UberGroup::All => do_all(registry, machine, responder),
    }
}

/// One group per configured motor
pub fn do_motors(
    registry: &Registry,
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    let count = (registry.capabilities().motors as usize).min(MOTOR_GROUPS.len());
    let mut tokens = [""; MAX_MOTORS as usize + 1];
    tokens[..count].copy_from_slice(&MOTOR_GROUPS[..count]);
    do_group_list(registry, &tokens[..=count], machine, responder)
}

pub fn do_axes(
    registry: &Registry,
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    do_group_list(registry, &AXIS_GROUPS, machine, responder)
}

/// Work offsets followed by the stored positions
pub fn do_offsets(
    registry: &Registry,
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    do_group_list(registry, &OFFSET_GROUPS, machine, responder)
}

/// One group per configured input channel
pub fn do_inputs(
    registry: &Registry,
    machine: &mut Machine,
    responder: &mut dyn Responder,
) -> Status {
    let count = (registry.capabilities().input_channels as usize).min(INPUT_GROUPS.len());
    let mut tokens = [""; MAX_INPUT_CHANNELS as usize + 1];
    tokens[..count].copy_from_slice(&INPUT_GROUPS[..count]);
    do_group_list(registry, &tokens[..=count], machine, responder)
}

/// `sys` and `p1`, then motors, axes and offsets
pub fn do_all(registry: &Registry, machine: &mut Machine, responder: &mut dyn Responder) -> Status {
    render_group(registry, "sys", machine, responder);
    render_group(registry, "p1", machine, responder);
    let parts = [
        do_motors(registry, machine, responder),
        do_axes(registry, machine, responder),
        do_offsets(registry, machine, responder),
    ];
    if parts.contains(&Status::Truncated) {
        Status::Truncated
    } else {
        Status::Complete
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::{String, ToString};
    use std::vec::Vec;

    use super::*;
    use crate::capabilities::Capabilities;
    use crate::nv::object::NvObj;

    /// Records each rendered group and its members
    #[derive(Default)]
    struct Recorder {
        groups: Vec<(String, Status, Vec<String>)>,
    }

    impl Responder for Recorder {
        fn respond(&mut self, response: &Response<'_>) {
            let parent = response.list.first().map(|nv| nv.token.to_string()).unwrap_or_default();
            let members = response
                .list
                .children()
                .iter()
                .map(|nv| nv.token.to_string())
                .collect();
            self.groups.push((parent, response.status, members));
        }
    }

    impl Recorder {
        fn parents(&self) -> Vec<&str> {
            self.groups.iter().map(|(p, _, _)| p.as_str()).collect()
        }
    }

    fn registry() -> Registry {
        Registry::new(Capabilities::default()).unwrap()
    }

    #[test]
    fn test_prefix_exceptions() {
        assert!(!group_is_prefixed("sr"));
        assert!(!group_is_prefixed("sys"));
        let reg = registry();
        let b = *reg.boundaries();
        for i in b.start_of_groups..b.start_of_uber_groups {
            let token = &reg.descriptor(i).unwrap().token;
            assert_eq!(group_is_prefixed(token), token.as_str() != "sys");
        }
    }

    #[test]
    fn test_axis_list_six_groups_complete() {
        let reg = registry();
        let mut m = Machine::default();
        let mut rec = Recorder::default();
        let status = do_group_list(&reg, &AXIS_GROUPS, &mut m, &mut rec);
        assert_eq!(status, Status::Complete);
        assert_eq!(rec.parents(), ["x", "y", "z", "a", "b", "c"]);
        assert!(rec.groups.iter().all(|(_, s, members)| *s == Status::Ok && !members.is_empty()));
    }

    #[test]
    fn test_list_truncated_without_sentinel() {
        let reg = registry();
        let mut m = Machine::default();
        let mut rec = Recorder::default();
        let tokens = [["x"; NV_MAX_OBJECTS].as_slice(), &["y", "z"]].concat();
        let status = do_group_list(&reg, &tokens, &mut m, &mut rec);
        assert_eq!(status, Status::Truncated);
        assert_eq!(rec.groups.len(), NV_MAX_OBJECTS);

        let mut rec = Recorder::default();
        assert_eq!(do_group_list(&reg, &["x", "y"], &mut m, &mut rec), Status::Complete);
    }

    #[test]
    fn test_unknown_group_rendered_with_error() {
        let reg = registry();
        let mut m = Machine::default();
        let mut rec = Recorder::default();
        let status = do_group_list(&reg, &["x", "zz", "y", ""], &mut m, &mut rec);
        assert_eq!(status, Status::Complete);
        assert_eq!(rec.parents(), ["x", "zz", "y"]);
        assert_eq!(rec.groups[1].1, Status::UnrecognizedName);
    }

    #[test]
    fn test_all_order() {
        let reg = registry();
        let mut m = Machine::default();
        let mut rec = Recorder::default();
        assert_eq!(do_all(&reg, &mut m, &mut rec), Status::Complete);
        assert_eq!(
            rec.parents(),
            [
                "sys", "p1", "1", "2", "3", "4", "x", "y", "z", "a", "b", "c", "g54", "g55", "g56",
                "g57", "g58", "g59", "g92", "g28", "g30"
            ]
        );
    }

    #[test]
    fn test_uber_lists_follow_capabilities() {
        let caps = Capabilities::default().with_motors(6).with_input_channels(9);
        let reg = Registry::new(caps).unwrap();
        let mut m = Machine::default();
        let mut rec = Recorder::default();
        do_motors(&reg, &mut m, &mut rec);
        assert_eq!(rec.parents(), ["1", "2", "3", "4", "5", "6"]);

        let mut rec = Recorder::default();
        do_inputs(&reg, &mut m, &mut rec);
        assert_eq!(rec.groups.len(), 9);
        assert_eq!(rec.parents()[8], "di9");
    }

    #[test]
    fn test_uber_group_get_through_registry() {
        let reg = registry();
        let mut m = Machine::default();
        let mut rec = Recorder::default();
        let mut list = NvList::with_token("", "o");
        assert_eq!(reg.get(&mut list, &mut m, &mut rec), Status::Complete);
        assert_eq!(rec.groups.len(), 9);
    }

    #[test]
    fn test_get_group_strips_prefix() {
        let reg = registry();
        let mut m = Machine::default();
        let mut list = NvList::with_token("", "g54");
        list.first_mut().unwrap().index = reg.index_of("", "g54");
        assert_eq!(get_group(&reg, &mut list, &mut m), Status::Ok);
        assert!(list.first().unwrap().is_parent());
        let tokens: Vec<&str> = list.children().iter().map(|nv| nv.token.as_str()).collect();
        assert_eq!(tokens, ["x", "y", "z", "a", "b", "c"]);
        assert!(list.children().iter().all(|nv| nv.depth == 1));
    }

    #[test]
    fn test_get_sys_keeps_tokens() {
        let reg = registry();
        let mut m = Machine::default();
        let mut list = NvList::with_token("", "sys");
        list.first_mut().unwrap().index = reg.index_of("", "sys");
        assert_eq!(get_group(&reg, &mut list, &mut m), Status::Ok);
        let tokens: Vec<&str> = list.children().iter().map(|nv| nv.token.as_str()).collect();
        assert!(tokens.contains(&"ja"));
        assert!(tokens.contains(&"fb"));
    }

    #[test]
    fn test_set_group_children() {
        let reg = registry();
        let mut m = Machine::default();
        let mut list = NvList::with_token("", "x");
        for (token, value) in [("vm", 1_000.0), ("xfr", 900.0)] {
            let mut nv = NvObj::with_token(token);
            nv.value = NvValue::Float(value);
            list.push(nv).unwrap();
        }
        assert_eq!(reg.set(&mut list, &mut m), Status::Ok);
        assert_eq!(m.axes[0].velocity_max, 1_000.0);
        assert_eq!(m.axes[0].feedrate_max, 900.0);
    }

    #[test]
    fn test_set_group_rejects_foreign_member() {
        let reg = registry();
        let mut m = Machine::default();
        let mut list = NvList::with_token("", "x");
        let mut nv = NvObj::with_token("yvm");
        nv.value = NvValue::Float(1.0);
        list.push(nv).unwrap();
        assert_eq!(reg.set(&mut list, &mut m), Status::UnrecognizedName);
        assert_eq!(m.axes[1].velocity_max, Machine::default().axes[1].velocity_max);
    }
}
