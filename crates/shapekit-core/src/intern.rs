//! Descriptor interning: the arena that owns every compiled type.
//!
//! Structurally identical type expressions intern to the same
//! `DescriptorId`, so descriptor equality in the common case is a u32
//! compare and nested descriptors are shared rather than deep-copied.
//! The interner also precomputes, per closed shape, the derived key-set
//! used to reject undeclared runtime keys.

use crate::types::{
    ArrayOf, ArrayOfId, DJB2_SEED, Descriptor, DescriptorId, ListId, ScalarMask, ShapeElement,
    ShapeId, ShapeKey, ShapeRecord, djb2_mix,
};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use shapekit_common::{Atom, ShardedInterner};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Arena and dedup tables for compiled descriptors.
///
/// Compilation happens single-threaded (`&mut self`); validation and
/// introspection are read-only (`&self`) and safe to run concurrently
/// once compilation is done.
pub struct DescriptorInterner {
    /// Program-wide string interner for shape keys and class names.
    pub strings: Arc<ShardedInterner>,

    descriptors: Vec<Descriptor>,
    dedup: FxHashMap<Descriptor, DescriptorId>,

    lists: Vec<Arc<[DescriptorId]>>,
    list_dedup: FxHashMap<Arc<[DescriptorId]>, u32>,

    shapes: Vec<Arc<ShapeRecord>>,
    shape_dedup: FxHashMap<Arc<ShapeRecord>, u32>,
    /// Derived key-sets, index-parallel with `shapes`; populated only for
    /// closed shapes.
    shape_key_sets: Vec<Option<Arc<FxHashSet<ShapeKey>>>>,

    array_ofs: Vec<ArrayOf>,
    array_dedup: FxHashMap<ArrayOf, u32>,
}

impl Default for DescriptorInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorInterner {
    pub fn new() -> Self {
        Self::with_strings(Arc::new(ShardedInterner::new()))
    }

    /// Build an interner sharing an existing string pool.
    pub fn with_strings(strings: Arc<ShardedInterner>) -> Self {
        DescriptorInterner {
            strings,
            descriptors: Vec::new(),
            dedup: FxHashMap::default(),
            lists: Vec::new(),
            list_dedup: FxHashMap::default(),
            shapes: Vec::new(),
            shape_dedup: FxHashMap::default(),
            shape_key_sets: Vec::new(),
            array_ofs: Vec::new(),
            array_dedup: FxHashMap::default(),
        }
    }

    fn intern_descriptor(&mut self, descriptor: Descriptor) -> DescriptorId {
        if let Some(&id) = self.dedup.get(&descriptor) {
            return id;
        }
        let id = DescriptorId(self.descriptors.len() as u32);
        self.descriptors.push(descriptor);
        self.dedup.insert(descriptor, id);
        id
    }

    /// Intern a scalar kind mask.
    pub fn intern_scalar(&mut self, mask: ScalarMask) -> DescriptorId {
        self.intern_descriptor(Descriptor::Scalar(mask))
    }

    /// Intern a nominal (class/interface) reference by name.
    pub fn intern_nominal(&mut self, name: Atom) -> DescriptorId {
        self.intern_descriptor(Descriptor::Nominal(name))
    }

    fn intern_list(&mut self, members: Vec<DescriptorId>) -> ListId {
        let arc: Arc<[DescriptorId]> = members.into();
        if let Some(&id) = self.list_dedup.get(&arc) {
            return ListId(id);
        }
        let id = self.lists.len() as u32;
        self.lists.push(arc.clone());
        self.list_dedup.insert(arc, id);
        ListId(id)
    }

    /// Intern a union. A single-member union collapses to that member.
    /// Member order is preserved for display.
    pub fn intern_union(&mut self, members: Vec<DescriptorId>) -> DescriptorId {
        debug_assert!(!members.is_empty(), "unions are non-empty");
        if members.len() == 1 {
            return members[0];
        }
        let list = self.intern_list(members);
        self.intern_descriptor(Descriptor::Union(list))
    }

    /// Intern an intersection. A single-member intersection collapses to
    /// that member.
    pub fn intern_intersection(&mut self, members: Vec<DescriptorId>) -> DescriptorId {
        debug_assert!(!members.is_empty(), "intersections are non-empty");
        if members.len() == 1 {
            return members[0];
        }
        let list = self.intern_list(members);
        self.intern_descriptor(Descriptor::Intersection(list))
    }

    /// Intern a homogeneous collection type. `depth` is derived here:
    /// one more than the element's depth when the element is itself an
    /// array-of, otherwise 1 (shapes do not count).
    pub fn intern_array_of(
        &mut self,
        element: DescriptorId,
        key: Option<DescriptorId>,
    ) -> DescriptorId {
        let depth = match self.descriptor(element) {
            Descriptor::ArrayOf(inner) => self.array_of(inner).depth.saturating_add(1),
            _ => 1,
        };
        let record = ArrayOf {
            element,
            key,
            depth,
        };
        let idx = if let Some(&idx) = self.array_dedup.get(&record) {
            idx
        } else {
            let idx = self.array_ofs.len() as u32;
            self.array_ofs.push(record);
            self.array_dedup.insert(record, idx);
            idx
        };
        self.intern_descriptor(Descriptor::ArrayOf(ArrayOfId(idx)))
    }

    /// Intern a shape record. Keys must already be unique (the compiler
    /// rejects duplicates). Computes the shape hash and, for closed
    /// shapes, the derived key-set.
    pub fn intern_shape(&mut self, elements: Vec<ShapeElement>, closed: bool) -> DescriptorId {
        let hash = self.compute_shape_hash(&elements);
        let record = Arc::new(ShapeRecord {
            elements,
            closed,
            hash,
        });
        let idx = if let Some(&idx) = self.shape_dedup.get(&record) {
            idx
        } else {
            let idx = self.shapes.len() as u32;
            let key_set = if closed {
                Some(Arc::new(
                    record.elements.iter().map(|e| e.key).collect::<FxHashSet<_>>(),
                ))
            } else {
                None
            };
            self.shapes.push(record.clone());
            self.shape_key_sets.push(key_set);
            self.shape_dedup.insert(record, idx);
            idx
        };
        self.intern_descriptor(Descriptor::Shape(ShapeId(idx)))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Look up a descriptor by id.
    #[inline]
    pub fn descriptor(&self, id: DescriptorId) -> Descriptor {
        self.descriptors[id.0 as usize]
    }

    /// Members of a union/intersection list.
    #[inline]
    pub fn list(&self, id: ListId) -> &[DescriptorId] {
        &self.lists[id.0 as usize]
    }

    /// An interned shape record.
    #[inline]
    pub fn shape(&self, id: ShapeId) -> &ShapeRecord {
        &self.shapes[id.0 as usize]
    }

    /// The derived key-set of a closed shape; `None` for open shapes.
    #[inline]
    pub fn shape_key_set(&self, id: ShapeId) -> Option<&FxHashSet<ShapeKey>> {
        self.shape_key_sets[id.0 as usize].as_deref()
    }

    /// An interned array-of record.
    #[inline]
    pub fn array_of(&self, id: ArrayOfId) -> ArrayOf {
        self.array_ofs[id.0 as usize]
    }

    /// Intern a string shape key.
    pub fn str_key(&self, s: &str) -> ShapeKey {
        ShapeKey::Str(self.strings.intern(s))
    }

    /// The validation-cache tag identifying an array-of's element kind
    /// (element descriptor plus optional key descriptor). Zero never
    /// collides with a real tag, so it doubles as "no tag".
    pub fn cache_tag(&self, id: ArrayOfId) -> u64 {
        let record = self.array_of(id);
        let key_part = record.key.map(|k| u64::from(k.0) + 1).unwrap_or(0);
        (key_part << 32) | (u64::from(record.element.0) + 1)
    }

    // ------------------------------------------------------------------
    // Hashing and comparison
    // ------------------------------------------------------------------

    /// A cheap fingerprint of a descriptor, folded into shape hashes the
    /// way the original mixed each element's raw type mask.
    pub fn pure_mask(&self, id: DescriptorId) -> u32 {
        match self.descriptor(id) {
            Descriptor::Scalar(mask) => mask.bits(),
            Descriptor::Nominal(name) => 0x8000_0000 | name.index(),
            Descriptor::Union(list) | Descriptor::Intersection(list) => {
                let mut acc = 0x1000_0000;
                for &member in self.list(list) {
                    acc ^= self.pure_mask(member);
                }
                acc
            }
            Descriptor::ArrayOf(arr) => {
                0x4000_0000 ^ self.pure_mask(self.array_of(arr).element)
            }
            Descriptor::Shape(shape) => 0x2000_0000 ^ self.shape(shape).hash,
        }
    }

    fn compute_shape_hash(&self, elements: &[ShapeElement]) -> u32 {
        let mut hash = djb2_mix(DJB2_SEED, elements.len() as u32);
        for element in elements {
            let key_hash = match element.key {
                ShapeKey::Int(n) => n as u32,
                ShapeKey::Str(atom) => {
                    let mut hasher = FxHasher::default();
                    self.strings.resolve(atom).as_bytes().hash(&mut hasher);
                    hasher.finish() as u32
                }
            };
            hash = djb2_mix(hash, key_hash);
            hash = djb2_mix(hash, self.pure_mask(element.ty));
            hash = djb2_mix(hash, u32::from(element.optional));
        }
        hash
    }

    /// Semantic equality of two descriptors.
    ///
    /// Identical ids are always equal. Beyond that, union and
    /// intersection members compare as sets, and shape elements compare
    /// by key rather than position.
    pub fn equivalent(&self, a: DescriptorId, b: DescriptorId) -> bool {
        if a == b {
            return true;
        }
        match (self.descriptor(a), self.descriptor(b)) {
            (Descriptor::Scalar(x), Descriptor::Scalar(y)) => x == y,
            (Descriptor::Nominal(x), Descriptor::Nominal(y)) => x == y,
            (Descriptor::Union(x), Descriptor::Union(y))
            | (Descriptor::Intersection(x), Descriptor::Intersection(y)) => {
                self.lists_equivalent(x, y)
            }
            (Descriptor::ArrayOf(x), Descriptor::ArrayOf(y)) => {
                let (ax, ay) = (self.array_of(x), self.array_of(y));
                if !self.equivalent(ax.element, ay.element) {
                    return false;
                }
                match (ax.key, ay.key) {
                    (None, None) => true,
                    (Some(kx), Some(ky)) => self.equivalent(kx, ky),
                    _ => false,
                }
            }
            (Descriptor::Shape(x), Descriptor::Shape(y)) => self.shapes_equivalent(x, y),
            _ => false,
        }
    }

    fn lists_equivalent(&self, x: ListId, y: ListId) -> bool {
        let (xs, ys) = (self.list(x), self.list(y));
        if xs.len() != ys.len() {
            return false;
        }
        xs.iter()
            .all(|&m| ys.iter().any(|&n| self.equivalent(m, n)))
            && ys
                .iter()
                .all(|&n| xs.iter().any(|&m| self.equivalent(m, n)))
    }

    fn shapes_equivalent(&self, x: ShapeId, y: ShapeId) -> bool {
        let (sx, sy) = (self.shape(x), self.shape(y));
        // Hash equality is necessary, not sufficient.
        if sx.hash != sy.hash
            || sx.elements.len() != sy.elements.len()
            || sx.closed != sy.closed
        {
            return false;
        }
        sx.elements.iter().all(|ex| match sy.find(ex.key) {
            Some(ey) => ex.optional == ey.optional && self.equivalent(ex.ty, ey.ty),
            None => false,
        })
    }

    /// Whether the descriptor transitively mentions a nominal type.
    ///
    /// Nominal conformance depends on the host's class hierarchy, so a
    /// validation outcome involving one is only meaningful for the host
    /// that produced it.
    pub fn contains_nominal(&self, id: DescriptorId) -> bool {
        match self.descriptor(id) {
            Descriptor::Scalar(_) => false,
            Descriptor::Nominal(_) => true,
            Descriptor::Union(list) | Descriptor::Intersection(list) => {
                self.list(list).iter().any(|&m| self.contains_nominal(m))
            }
            Descriptor::ArrayOf(arr) => {
                let record = self.array_of(arr);
                self.contains_nominal(record.element)
                    || record.key.is_some_and(|k| self.contains_nominal(k))
            }
            Descriptor::Shape(shape) => self
                .shape(shape)
                .elements
                .iter()
                .any(|e| self.contains_nominal(e.ty)),
        }
    }

    /// Whether a value of `null` conforms to the descriptor.
    pub fn allows_null(&self, id: DescriptorId) -> bool {
        match self.descriptor(id) {
            Descriptor::Scalar(mask) => mask.contains(ScalarMask::NULL),
            Descriptor::Union(list) => self.list(list).iter().any(|&m| self.allows_null(m)),
            _ => false,
        }
    }
}
