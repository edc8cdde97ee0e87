// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Untyped value slot.
//!
//! A [`Dynamic`] field holds a value whose concrete type is only known at
//! runtime. Both directions first exchange the content's type tag as a
//! string scalar (empty for an empty slot), then hand the content to the
//! boxed constructor or describer registered under that tag. The content
//! type must have been published (e.g. through [`HandlerCache::register`])
//! beforehand.
//!
//! Describing a slot whose tag the source replaces builds the new content
//! from scratch, so describe-from-empty issues the same calls as create.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::{BuildError, InspectError};
use crate::handler::{
    Category, CreateFn, DescribeFn, HandlerCache, Inspect, SchemaVersion, TypeHandler,
};
use crate::inspector::{Inspector, ScalarMut};

/// Slot holding a value of any registered type, or nothing.
#[derive(Default)]
pub struct Dynamic {
    value: Option<Box<dyn Any + Send + Sync>>,
}

impl Dynamic {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// `TypeId` of the held value.
    #[must_use]
    pub fn content_type_id(&self) -> Option<TypeId> {
        self.value.as_deref().map(|value| value.type_id())
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|value| value.downcast_ref())
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.as_deref_mut().and_then(|value| value.downcast_mut())
    }

    /// Replace the content, returning the previous one.
    pub fn replace<T: Any + Send + Sync>(&mut self, value: T) -> Option<Box<dyn Any + Send + Sync>> {
        self.value.replace(Box::new(value))
    }

    pub fn take(&mut self) -> Option<Box<dyn Any + Send + Sync>> {
        self.value.take()
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("content", &self.content_type_id())
            .finish()
    }
}

impl Inspect for Dynamic {
    const CATEGORY: Category = Category::Dynamic;

    fn build_handler(cache: &HandlerCache) -> Result<TypeHandler<Self>, BuildError> {
        let create_cache = cache.downgrade();
        let create: CreateFn<Self> = Box::new(
            move |inspector: &mut dyn Inspector, version: SchemaVersion, is_latest: bool| {
                let mut tag = String::new();
                inspector.scalar(ScalarMut::String(&mut tag))?;
                if tag.is_empty() {
                    return Ok(Dynamic::empty());
                }
                let entry = create_cache
                    .upgrade()?
                    .boxed_entry_by_tag(&tag)
                    .ok_or(InspectError::UnknownTypeTag { tag })?;
                Ok(Dynamic {
                    value: Some((entry.create)(inspector, version, is_latest)?),
                })
            },
        );

        let describe_cache = cache.downgrade();
        let describe: DescribeFn<Self> = Box::new(
            move |inspector: &mut dyn Inspector, slot: &mut Dynamic, version: SchemaVersion| {
                let cache = describe_cache.upgrade()?;
                let current = match slot.value.as_deref() {
                    Some(value) => {
                        let type_id = value.type_id();
                        let entry = cache
                            .boxed_entry(type_id)
                            .ok_or(InspectError::UnregisteredType { type_id })?;
                        Some(entry)
                    }
                    None => None,
                };

                let mut tag = current
                    .as_ref()
                    .map_or_else(String::new, |entry| entry.tag.to_owned());
                inspector.scalar(ScalarMut::String(&mut tag))?;
                if tag.is_empty() {
                    slot.value = None;
                    return Ok(());
                }

                if let Some(entry) = current.filter(|entry| entry.tag == tag) {
                    if let Some(boxed) = slot.value.as_mut() {
                        return (entry.describe)(inspector, boxed, version);
                    }
                }

                let entry = cache
                    .boxed_entry_by_tag(&tag)
                    .ok_or(InspectError::UnknownTypeTag { tag })?;
                slot.value = Some((entry.create)(inspector, version, true)?);
                Ok(())
            },
        );

        Ok(TypeHandler::new(Category::Dynamic, create, describe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::ScalarValue;
    use crate::testing::{Event, Probe};

    crate::inspect_enum! {
        struct Level(u16) {
            LOW = 1,
            HIGH = 2,
        }
    }

    fn tag_of<T>() -> ScalarValue {
        ScalarValue::String(std::any::type_name::<T>().into())
    }

    #[test]
    fn test_dynamic_enum_goes_through_boxed_describer() {
        let cache = HandlerCache::new();
        cache.register::<Level>().expect("register");

        let mut slot = Dynamic::new(Level::LOW);
        let mut probe = Probe::new().with_scalars([tag_of::<Level>(), ScalarValue::U16(2)]);
        cache.describe(&mut probe, &mut slot, 1).expect("describe");

        assert_eq!(probe.seen, vec![tag_of::<Level>(), ScalarValue::U16(1)]);
        assert_eq!(slot.downcast_ref::<Level>(), Some(&Level::HIGH));
    }

    #[test]
    fn test_dynamic_list_described_in_place() {
        let cache = HandlerCache::new();
        cache.register::<Vec<i64>>().expect("register");

        let mut slot = Dynamic::new(vec![1i64, 2, 3]);
        let mut probe = Probe::new().with_counts([1]);
        cache.describe(&mut probe, &mut slot, 1).expect("describe");

        assert_eq!(slot.downcast_ref::<Vec<i64>>(), Some(&vec![1]));
        assert_eq!(probe.events[0], Event::Scalar(tag_of::<Vec<i64>>()));
    }

    #[test]
    fn test_new_tag_replaces_content() {
        let cache = HandlerCache::new();
        cache.register::<Vec<i64>>().expect("register");
        cache.register::<Level>().expect("register");

        let mut slot = Dynamic::new(vec![1i64, 2, 3]);
        let mut probe = Probe::new().with_scalars([tag_of::<Level>(), ScalarValue::U16(2)]);
        cache.describe(&mut probe, &mut slot, 1).expect("describe");

        assert_eq!(slot.downcast_ref::<Level>(), Some(&Level::HIGH));
        assert_eq!(probe.calls.begin, 0);
    }

    #[test]
    fn test_create_builds_tagged_content() {
        let cache = HandlerCache::new();
        cache.register::<Level>().expect("register");

        let mut probe = Probe::new().with_scalars([tag_of::<Level>(), ScalarValue::U16(1)]);
        let created: Dynamic = cache.create(&mut probe, 1, true).expect("create");

        assert_eq!(created.downcast_ref::<Level>(), Some(&Level::LOW));
    }

    #[test]
    fn test_empty_tag_clears_slot() {
        let cache = HandlerCache::new();
        cache.register::<Level>().expect("register");

        let mut slot = Dynamic::new(Level::HIGH);
        let mut probe = Probe::new().with_scalars([ScalarValue::String(String::new())]);
        cache.describe(&mut probe, &mut slot, 1).expect("describe");

        assert!(slot.is_empty());
        assert_eq!(probe.calls.scalar, 1);
    }

    #[test]
    fn test_unknown_tag_is_error() {
        let cache = HandlerCache::new();
        let mut probe = Probe::new().with_scalars([ScalarValue::String("no::Such".into())]);

        let result: Result<Dynamic, _> = cache.create(&mut probe, 1, true);

        match result {
            Err(InspectError::UnknownTypeTag { tag }) => assert_eq!(tag, "no::Such"),
            other => panic!("expected UnknownTypeTag, got {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_content_is_error() {
        let cache = HandlerCache::new();
        let mut slot = Dynamic::new(3.5f32);
        let mut probe = Probe::new();

        let result = cache.describe(&mut probe, &mut slot, 1);

        match result {
            Err(InspectError::UnregisteredType { type_id }) => {
                assert_eq!(type_id, TypeId::of::<f32>());
            }
            other => panic!("expected UnregisteredType, got {:?}", other),
        }
        assert!(probe.events.is_empty());
    }

    #[test]
    fn test_empty_slot_exchanges_empty_tag() {
        let cache = HandlerCache::new();
        let mut probe = Probe::new();

        let mut slot = Dynamic::empty();
        cache.describe(&mut probe, &mut slot, 1).expect("describe");
        let created: Dynamic = cache.create(&mut probe, 1, true).expect("create");

        assert!(slot.is_empty());
        assert!(created.is_empty());
        let empty = Event::Scalar(ScalarValue::String(String::new()));
        assert_eq!(probe.events, vec![empty.clone(), empty]);
    }
}
