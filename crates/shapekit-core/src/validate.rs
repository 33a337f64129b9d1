//! Runtime validation of values against compiled descriptors.
//!
//! Validation is read-only over both the descriptor arena and the value;
//! the one write is the validation-cache tag on a collection that fully
//! passed a homogeneous check. Failures are deterministic: shape fields
//! are walked in declaration order, collection entries in enumeration
//! order, and the first mismatch wins.

use crate::diagnostics::{KeyPath, ValidationFailure};
use crate::host::TypeHost;
use crate::intern::DescriptorInterner;
use crate::types::{ArrayOfId, Descriptor, DescriptorId, ScalarMask, ShapeId, ShapeKey};
use crate::value::{Value, ZArray};
use shapekit_common::limits::{MAX_VALIDATION_DEPTH, STACK_GROW_SIZE, STACK_RED_ZONE};
use tracing::trace;

/// Checks values against descriptors, consulting the host for nominal
/// types. Cheap to construct; borrows the arena.
pub struct Validator<'a> {
    interner: &'a DescriptorInterner,
    host: &'a dyn TypeHost,
}

impl<'a> Validator<'a> {
    pub fn new(interner: &'a DescriptorInterner, host: &'a dyn TypeHost) -> Validator<'a> {
        Validator { interner, host }
    }

    /// Validate `value` against `ty`, reporting the first failure.
    pub fn check(&self, value: &Value, ty: DescriptorId) -> Result<(), ValidationFailure> {
        let mut path = KeyPath::root();
        self.check_inner(value, ty, &mut path, 0)
    }

    fn check_inner(
        &self,
        value: &Value,
        ty: DescriptorId,
        path: &mut KeyPath,
        depth: usize,
    ) -> Result<(), ValidationFailure> {
        if depth > MAX_VALIDATION_DEPTH {
            return Err(ValidationFailure::DepthLimitExceeded { path: path.clone() });
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match self.interner.descriptor(ty) {
                Descriptor::ArrayOf(arr) => self.check_array_of(value, arr, path, depth),
                Descriptor::Shape(shape) => self.check_shape(value, shape, path, depth),
                _ => {
                    if self.conforms(value, ty, depth) {
                        Ok(())
                    } else {
                        Err(ValidationFailure::TypeMismatch {
                            path: path.clone(),
                            expected: ty,
                            found: value.kind(),
                        })
                    }
                }
            }
        })
    }

    fn check_array_of(
        &self,
        value: &Value,
        id: ArrayOfId,
        path: &mut KeyPath,
        depth: usize,
    ) -> Result<(), ValidationFailure> {
        let Some(arr) = value.as_array() else {
            return Err(ValidationFailure::NotACollection {
                path: path.clone(),
                found: value.kind(),
            });
        };
        let record = self.interner.array_of(id);
        // The tag only identifies the descriptor, not the host that
        // validated against it, so a result that depended on a class
        // hierarchy must not be reused.
        let cacheable = self.cacheable(id);
        let tag = self.interner.cache_tag(id);
        if cacheable && arr.cache_tag() == tag {
            trace!(elements = arr.len(), "validation cache hit");
            return Ok(());
        }
        for (&key, entry) in arr.iter() {
            if let Some(key_ty) = record.key {
                if !self.key_conforms(key, key_ty) {
                    return Err(ValidationFailure::KeyTypeMismatch {
                        path: path.clone(),
                        key,
                        expected: key_ty,
                    });
                }
            }
            match self.interner.descriptor(record.element) {
                Descriptor::ArrayOf(_) | Descriptor::Shape(_) => {
                    path.push(key);
                    let nested = self.check_inner(entry, record.element, path, depth + 1);
                    path.pop();
                    nested?;
                }
                _ => {
                    if !self.conforms(entry, record.element, depth + 1) {
                        return Err(ValidationFailure::ElementTypeMismatch {
                            path: path.clone(),
                            key,
                            expected: record.element,
                            found: entry.kind(),
                        });
                    }
                }
            }
        }
        // Remember the element kind this instance now conforms to, so the
        // next check of an unmutated instance is O(1).
        if cacheable {
            arr.set_cache_tag(tag);
        }
        Ok(())
    }

    fn check_shape(
        &self,
        value: &Value,
        id: ShapeId,
        path: &mut KeyPath,
        depth: usize,
    ) -> Result<(), ValidationFailure> {
        let Some(arr) = value.as_array() else {
            return Err(ValidationFailure::NotACollection {
                path: path.clone(),
                found: value.kind(),
            });
        };
        let record = self.interner.shape(id);
        for element in &record.elements {
            let Some(entry) = arr.get(element.key) else {
                if element.optional {
                    continue;
                }
                return Err(ValidationFailure::MissingField {
                    path: path.clone(),
                    key: element.key,
                });
            };
            match self.interner.descriptor(element.ty) {
                Descriptor::ArrayOf(_) | Descriptor::Shape(_) => {
                    path.push(element.key);
                    let nested = self.check_inner(entry, element.ty, path, depth + 1);
                    path.pop();
                    nested?;
                }
                _ => {
                    if !self.conforms(entry, element.ty, depth + 1) {
                        return Err(ValidationFailure::FieldTypeMismatch {
                            path: path.clone(),
                            key: element.key,
                            expected: element.ty,
                            found: entry.kind(),
                        });
                    }
                }
            }
        }
        if let Some(declared) = self.interner.shape_key_set(id) {
            // Closed shape: the first undeclared key in enumeration order
            // is the failure.
            for (&key, _) in arr.iter() {
                if !declared.contains(&key) {
                    return Err(ValidationFailure::UnexpectedField {
                        path: path.clone(),
                        key,
                    });
                }
            }
        }
        Ok(())
    }

    /// Boolean conformance, used for union/intersection members and for
    /// non-composite element types where no nested failure detail is
    /// needed.
    fn conforms(&self, value: &Value, ty: DescriptorId, depth: usize) -> bool {
        if depth > MAX_VALIDATION_DEPTH {
            return false;
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match self.interner.descriptor(ty) {
                Descriptor::Scalar(mask) => scalar_conforms(mask, value),
                Descriptor::Nominal(name) => match value {
                    Value::Object(obj) => self.host.is_instance_of(obj.class, name),
                    _ => false,
                },
                Descriptor::Union(list) => self
                    .interner
                    .list(list)
                    .iter()
                    .any(|&m| self.conforms(value, m, depth + 1)),
                Descriptor::Intersection(list) => self
                    .interner
                    .list(list)
                    .iter()
                    .all(|&m| self.conforms(value, m, depth + 1)),
                Descriptor::ArrayOf(arr) => match value.as_array() {
                    Some(z) => self.array_conforms(z, arr, depth),
                    None => false,
                },
                Descriptor::Shape(shape) => match value.as_array() {
                    Some(z) => self.shape_conforms(z, shape, depth),
                    None => false,
                },
            }
        })
    }

    fn array_conforms(&self, arr: &ZArray, id: ArrayOfId, depth: usize) -> bool {
        let record = self.interner.array_of(id);
        let cacheable = self.cacheable(id);
        let tag = self.interner.cache_tag(id);
        if cacheable && arr.cache_tag() == tag {
            return true;
        }
        let ok = arr.iter().all(|(&key, entry)| {
            record.key.is_none_or(|key_ty| self.key_conforms(key, key_ty))
                && self.conforms(entry, record.element, depth + 1)
        });
        if ok && cacheable {
            arr.set_cache_tag(tag);
        }
        ok
    }

    /// A collection result may only be cached when it cannot depend on
    /// the host: nominal element or key types resolve through the class
    /// hierarchy of whichever host ran the check.
    fn cacheable(&self, id: ArrayOfId) -> bool {
        let record = self.interner.array_of(id);
        !self.interner.contains_nominal(record.element)
            && !record.key.is_some_and(|k| self.interner.contains_nominal(k))
    }

    fn shape_conforms(&self, arr: &ZArray, id: ShapeId, depth: usize) -> bool {
        let record = self.interner.shape(id);
        let fields_ok = record.elements.iter().all(|element| match arr.get(element.key) {
            Some(entry) => self.conforms(entry, element.ty, depth + 1),
            None => element.optional,
        });
        if !fields_ok {
            return false;
        }
        match self.interner.shape_key_set(id) {
            Some(declared) => arr.iter().all(|(key, _)| declared.contains(key)),
            None => true,
        }
    }

    /// Does a runtime collection key satisfy the declared key type?
    /// Keys are only ever int or interned string.
    fn key_conforms(&self, key: ShapeKey, ty: DescriptorId) -> bool {
        match self.interner.descriptor(ty) {
            Descriptor::Scalar(mask) => match key {
                ShapeKey::Int(_) => mask.contains(ScalarMask::INT),
                ShapeKey::Str(_) => mask.contains(ScalarMask::STRING),
            },
            Descriptor::Union(list) => self
                .interner
                .list(list)
                .iter()
                .any(|&m| self.key_conforms(key, m)),
            _ => false,
        }
    }
}

fn scalar_conforms(mask: ScalarMask, value: &Value) -> bool {
    match value {
        Value::Null => mask.contains(ScalarMask::NULL),
        Value::Bool(true) => mask.contains(ScalarMask::TRUE),
        Value::Bool(false) => mask.contains(ScalarMask::FALSE),
        Value::Int(_) => mask.contains(ScalarMask::INT),
        Value::Float(_) => mask.contains(ScalarMask::FLOAT),
        Value::Str(_) => mask.contains(ScalarMask::STRING),
        Value::Array(_) => mask.contains(ScalarMask::ARRAY),
        Value::Object(_) => mask.contains(ScalarMask::OBJECT),
    }
}
