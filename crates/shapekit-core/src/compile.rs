//! The descriptor compiler: parse tree in, interned descriptor out.
//!
//! All compile-time state lives in an explicit [`CompileContext`] — the
//! descriptor arena plus the alias table — so the compiler is re-entrant
//! and testable in isolation; there is no hidden global table.
//!
//! Any structural error (duplicate key, bad key literal, unresolved
//! alias, an override failing the covariance rule during inheritance
//! flattening) is fatal; there is no partial compile result.

use crate::ast::{KeyLiteral, ShapeField, TypeExpr};
use crate::diagnostics::CompileError;
use crate::host::NullHost;
use crate::intern::DescriptorInterner;
use crate::types::{Descriptor, DescriptorId, ScalarMask, ShapeElement, ShapeKey};
use crate::variance::covariant_ok;
use rustc_hash::{FxHashMap, FxHashSet};
use shapekit_common::Atom;
use shapekit_common::limits::{MAX_TYPE_NESTING, SHAPE_ELEMENTS_INLINE, TYPE_LIST_INLINE};
use smallvec::SmallVec;
use tracing::trace;

type MemberBuffer = SmallVec<[DescriptorId; TYPE_LIST_INLINE]>;
type ElementBuffer = SmallVec<[ShapeElement; SHAPE_ELEMENTS_INLINE]>;

/// Compilation context: the descriptor arena and the alias table for
/// named shape/type declarations.
///
/// One context per program (or per compilation unit under test).
/// Compilation is single-threaded; each descriptor is built exactly
/// once and immutable afterwards.
pub struct CompileContext {
    pub interner: DescriptorInterner,
    aliases: FxHashMap<Atom, DescriptorId>,
}

impl Default for CompileContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompileContext {
    pub fn new() -> Self {
        CompileContext {
            interner: DescriptorInterner::new(),
            aliases: FxHashMap::default(),
        }
    }

    pub fn with_interner(interner: DescriptorInterner) -> Self {
        CompileContext {
            interner,
            aliases: FxHashMap::default(),
        }
    }

    /// Compile a type expression into a descriptor.
    pub fn compile(&mut self, expr: &TypeExpr) -> Result<DescriptorId, CompileError> {
        self.compile_inner(expr, 0)
    }

    /// Compile and register a named type alias. Later expressions (and
    /// `extends` clauses) referring to `name` resolve to the returned
    /// descriptor.
    pub fn define_alias(
        &mut self,
        name: &str,
        expr: &TypeExpr,
    ) -> Result<DescriptorId, CompileError> {
        let id = self.compile_inner(expr, 0)?;
        let atom = self.interner.strings.intern(name);
        trace!(alias = name, id = id.0, "registered type alias");
        self.aliases.insert(atom, id);
        Ok(id)
    }

    /// Resolve a previously registered alias by name.
    pub fn alias(&self, name: &str) -> Option<DescriptorId> {
        let atom = self.interner.strings.intern(name);
        self.aliases.get(&atom).copied()
    }

    fn compile_inner(&mut self, expr: &TypeExpr, depth: usize) -> Result<DescriptorId, CompileError> {
        if depth > MAX_TYPE_NESTING {
            return Err(CompileError::NestingTooDeep);
        }
        match expr {
            TypeExpr::Scalar(kind) => Ok(self.interner.intern_scalar(kind.mask())),
            TypeExpr::Name(name) => {
                let atom = self.interner.strings.intern(name);
                if let Some(&id) = self.aliases.get(&atom) {
                    Ok(id)
                } else {
                    // Not an alias: a class/interface reference, resolved
                    // lazily by the host at validation time.
                    Ok(self.interner.intern_nominal(atom))
                }
            }
            TypeExpr::Nullable(inner) => {
                let inner = self.compile_inner(inner, depth + 1)?;
                Ok(self.add_null(inner))
            }
            TypeExpr::Union(members) => self.compile_union(members, depth),
            TypeExpr::Intersection(members) => {
                let mut out = MemberBuffer::new();
                for member in members {
                    out.push(self.compile_inner(member, depth + 1)?);
                }
                Ok(self.interner.intern_intersection(out.into_vec()))
            }
            TypeExpr::ArrayOf { key, element } => {
                let key = match key {
                    Some(key) => Some(self.compile_inner(key, depth + 1)?),
                    None => None,
                };
                let element = self.compile_inner(element, depth + 1)?;
                Ok(self.interner.intern_array_of(element, key))
            }
            TypeExpr::Shape {
                fields,
                closed,
                extends,
            } => self.compile_shape(fields, *closed, extends.as_deref(), depth),
        }
    }

    /// Compile a union, folding every scalar member into one kind mask
    /// (placed where the first scalar appeared) so `int|string|User`
    /// becomes two members, not three.
    fn compile_union(
        &mut self,
        members: &[TypeExpr],
        depth: usize,
    ) -> Result<DescriptorId, CompileError> {
        let mut out = MemberBuffer::new();
        let mut mask = ScalarMask::empty();
        let mut scalar_pos: Option<usize> = None;
        for member in members {
            let id = self.compile_inner(member, depth + 1)?;
            match self.interner.descriptor(id) {
                Descriptor::Scalar(bits) => {
                    if scalar_pos.is_none() {
                        scalar_pos = Some(out.len());
                    }
                    mask |= bits;
                }
                _ => out.push(id),
            }
        }
        if let Some(pos) = scalar_pos {
            let scalar = self.interner.intern_scalar(mask);
            out.insert(pos, scalar);
        }
        Ok(self.interner.intern_union(out.into_vec()))
    }

    /// Widen a descriptor to also accept null (`?T`).
    fn add_null(&mut self, id: DescriptorId) -> DescriptorId {
        match self.interner.descriptor(id) {
            Descriptor::Scalar(mask) => self.interner.intern_scalar(mask | ScalarMask::NULL),
            Descriptor::Union(list) => {
                if self.interner.allows_null(id) {
                    return id;
                }
                let mut members = self.interner.list(list).to_vec();
                members.push(self.interner.intern_scalar(ScalarMask::NULL));
                self.interner.intern_union(members)
            }
            _ => {
                let null = self.interner.intern_scalar(ScalarMask::NULL);
                self.interner.intern_union(vec![id, null])
            }
        }
    }

    fn compile_shape(
        &mut self,
        fields: &[ShapeField],
        closed: bool,
        extends: Option<&str>,
        depth: usize,
    ) -> Result<DescriptorId, CompileError> {
        // Inheritance flattening: parent fields first, child overrides
        // replacing parent fields in place. Produces a new descriptor;
        // the parent's is untouched.
        let mut elements = ElementBuffer::new();
        let mut parent_name = None;
        if let Some(name) = extends {
            let parent = self
                .alias(name)
                .ok_or_else(|| CompileError::UnresolvedAlias(name.to_string()))?;
            let Descriptor::Shape(shape) = self.interner.descriptor(parent) else {
                // `extends` must name a shape alias.
                return Err(CompileError::UnresolvedAlias(name.to_string()));
            };
            elements.extend(self.interner.shape(shape).elements.iter().copied());
            parent_name = Some(name.to_string());
        }
        let mut positions: FxHashMap<ShapeKey, usize> =
            elements.iter().enumerate().map(|(i, e)| (e.key, i)).collect();
        let mut seen: FxHashSet<ShapeKey> = FxHashSet::default();

        for field in fields {
            let key = self.compile_key(&field.key)?;
            if !seen.insert(key) {
                return Err(CompileError::DuplicateKey(self.render_key(key)));
            }
            let ty = self.compile_inner(&field.ty, depth + 1)?;
            let element = ShapeElement {
                key,
                ty,
                optional: field.optional,
            };
            match positions.get(&key) {
                Some(&pos) => {
                    // Override of an inherited field: must stay covariant
                    // and may not relax a required field to optional.
                    let parent_elem = elements[pos];
                    let narrowing_ok = covariant_ok(&self.interner, &NullHost, ty, parent_elem.ty)
                        && (parent_elem.optional || !field.optional);
                    if !narrowing_ok {
                        return Err(CompileError::InheritanceNarrowing {
                            parent: parent_name.clone().unwrap_or_default(),
                            key: self.render_key(key),
                        });
                    }
                    elements[pos] = element;
                }
                None => {
                    positions.insert(key, elements.len());
                    elements.push(element);
                }
            }
        }

        trace!(
            fields = elements.len(),
            closed,
            extends = extends.unwrap_or(""),
            "compiled shape"
        );
        Ok(self.interner.intern_shape(elements.into_vec(), closed))
    }

    fn compile_key(&mut self, literal: &KeyLiteral) -> Result<ShapeKey, CompileError> {
        match literal {
            KeyLiteral::Str(s) => Ok(ShapeKey::Str(self.interner.strings.intern(s))),
            KeyLiteral::Int(n) => Ok(ShapeKey::Int(*n)),
            KeyLiteral::Float(x) => Err(CompileError::InvalidKeyLiteral(format!("float {x}"))),
            KeyLiteral::Bool(b) => Err(CompileError::InvalidKeyLiteral(format!("bool {b}"))),
        }
    }

    fn render_key(&self, key: ShapeKey) -> String {
        match key {
            ShapeKey::Int(n) => n.to_string(),
            ShapeKey::Str(atom) => self.interner.strings.resolve(atom).to_string(),
        }
    }
}
