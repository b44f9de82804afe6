//! Transient value objects
//!
//! An [`NvObj`] carries one parameter through a get, set or print. An
//! [`NvList`] is the body of one request: a parent object followed by its
//! children, plus any messages raised while the request ran. Lists are built
//! on the caller's stack for each request and for each group expanded within
//! it; nothing here outlives a single command.

use heapless::{String, Vec};

use super::{
    Index, GROUP_LEN, NV_LIST_LEN, NV_MESSAGE_COUNT, NV_MESSAGE_LEN, NV_STRING_LEN, TOKEN_LEN,
};

/// Token text as carried by an object
pub type Token = String<TOKEN_LEN>;

/// Group text as carried by an object
pub type Group = String<GROUP_LEN>;

/// Messages queued for the response
pub type MessageQueue = Vec<String<NV_MESSAGE_LEN>, NV_MESSAGE_COUNT>;

/// Value type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Null,
    /// Group marker; children follow in the list
    Parent,
    Float,
    Int,
    Data,
    Str,
}

/// Parameter value in transport form
#[derive(Debug, Clone, PartialEq)]
pub enum NvValue {
    Null,
    Parent,
    Float(f32),
    Int(i64),
    Data(u32),
    Str(String<NV_STRING_LEN>),
}

impl NvValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            NvValue::Null => ValueType::Null,
            NvValue::Parent => ValueType::Parent,
            NvValue::Float(_) => ValueType::Float,
            NvValue::Int(_) => ValueType::Int,
            NvValue::Data(_) => ValueType::Data,
            NvValue::Str(_) => ValueType::Str,
        }
    }

    /// Numeric value as a float
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            NvValue::Float(v) => Some(v),
            NvValue::Int(v) => Some(v as f32),
            NvValue::Data(v) => Some(v as f32),
            _ => None,
        }
    }

    /// Numeric value as an integer, truncating floats
    ///
    /// NaN and infinities have no integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            NvValue::Int(v) => Some(v),
            NvValue::Data(v) => Some(v as i64),
            NvValue::Float(v) if v.is_finite() => Some(v as i64),
            _ => None,
        }
    }

    /// Non-zero numeric values are true
    pub fn is_true(&self) -> bool {
        self.as_f32().is_some_and(|v| v != 0.0)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            NvValue::Float(_) | NvValue::Int(_) | NvValue::Data(_)
        )
    }
}

/// One parameter in flight
#[derive(Debug, Clone, PartialEq)]
pub struct NvObj {
    /// Resolved table position, None until resolved
    pub index: Option<Index>,
    pub group: Group,
    pub token: Token,
    /// 0 for the top-level object, 1 for group members
    pub depth: u8,
    /// Display digits for float values
    pub precision: u8,
    pub value: NvValue,
}

impl NvObj {
    pub fn new() -> Self {
        Self {
            index: None,
            group: String::new(),
            token: String::new(),
            depth: 0,
            precision: 0,
            value: NvValue::Null,
        }
    }

    /// Object for `token`, truncated to the token length
    pub fn with_token(token: &str) -> Self {
        let mut nv = Self::new();
        nv.set_token(token);
        nv
    }

    pub fn set_token(&mut self, token: &str) {
        self.token = truncated(token);
    }

    pub fn set_group(&mut self, group: &str) {
        self.group = truncated(group);
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn is_parent(&self) -> bool {
        self.value == NvValue::Parent
    }
}

impl Default for NvObj {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy as much of `text` as fits, never splitting a character
pub(crate) fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Body of one request
#[derive(Debug, Clone, Default)]
pub struct NvList {
    pub objects: Vec<NvObj, NV_LIST_LEN>,
    pub messages: MessageQueue,
}

impl NvList {
    pub fn new() -> Self {
        Self::default()
    }

    /// List holding a single object for `group`/`token`
    pub fn with_token(group: &str, token: &str) -> Self {
        let mut list = Self::new();
        let mut nv = NvObj::with_token(token);
        nv.set_group(group);
        // capacity is never zero
        let _ = list.objects.push(nv);
        list
    }

    /// Append an object, returning it back when the list is full
    pub fn push(&mut self, nv: NvObj) -> Result<(), NvObj> {
        self.objects.push(nv)
    }

    pub fn first(&self) -> Option<&NvObj> {
        self.objects.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut NvObj> {
        self.objects.first_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NvObj> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects after the parent
    pub fn children(&self) -> &[NvObj] {
        self.objects.get(1..).unwrap_or(&[])
    }

    /// Drop everything but the first object
    pub fn truncate_children(&mut self) {
        self.objects.truncate(1);
    }
}

/// Queue a message for the response, dropping it when the queue is full
pub fn add_conditional_message(queue: &mut MessageQueue, message: &str) {
    let _ = queue.push(truncated(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(NvValue::Null.value_type(), ValueType::Null);
        assert_eq!(NvValue::Parent.value_type(), ValueType::Parent);
        assert_eq!(NvValue::Float(1.0).value_type(), ValueType::Float);
        assert_eq!(NvValue::Int(1).value_type(), ValueType::Int);
        assert_eq!(NvValue::Data(1).value_type(), ValueType::Data);
    }

    #[test]
    fn test_non_finite_has_no_integer() {
        assert_eq!(NvValue::Float(f32::NAN).as_i64(), None);
        assert_eq!(NvValue::Float(f32::INFINITY).as_i64(), None);
        assert_eq!(NvValue::Float(2.9).as_i64(), Some(2));
    }

    #[test]
    fn test_token_truncated() {
        let nv = NvObj::with_token("shutdown");
        assert_eq!(nv.token.as_str(), "shutdo");
    }

    #[test]
    fn test_list_bounded() {
        let mut list = NvList::new();
        for _ in 0..NV_LIST_LEN {
            assert!(list.push(NvObj::new()).is_ok());
        }
        assert!(list.push(NvObj::new()).is_err());
    }

    #[test]
    fn test_message_queue_drops_overflow() {
        let mut list = NvList::new();
        for _ in 0..NV_MESSAGE_COUNT + 2 {
            add_conditional_message(&mut list.messages, "*** NOTICE ***");
        }
        assert_eq!(list.messages.len(), NV_MESSAGE_COUNT);
    }
}
