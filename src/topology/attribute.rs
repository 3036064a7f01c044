//! Cell attributes: optional payloads shared by all darts of one cell.
//!
//! Attributes of dimension `i` live in a per-dimension arena owned by the
//! map. The map keeps one type-erased [`AttributeStore`] per enabled
//! dimension and dispatches on the dimension index; typed access goes
//! through [`AttributeArena<T>`] by downcasting.
//!
//! Each attribute stores
//! - its user payload (`info`, any [`CellInfo`] type, `()` for none),
//! - one dart of the cell it describes (when `T::SUPPORTS_CELL_DART`),
//! - the number of darts referencing it.
//!
//! Split/merge hooks are resolved per call: a dynamic hook registered on the
//! map wins, otherwise the static [`CellInfo::on_split`] /
//! [`CellInfo::on_merge`] of the payload type runs.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::topology::dart::DartHandle;

slotmap::new_key_type! {
    /// Stable, generation-checked reference to an attribute of one dimension.
    pub struct AttributeHandle;
}

/// Payload type attached to cell attributes.
pub trait CellInfo: Clone + Default + fmt::Debug + 'static {
    /// Whether attributes of this type remember one dart of their cell.
    const SUPPORTS_CELL_DART: bool = true;

    /// Called when the cell of `self` absorbs the cell of `other`; `other`
    /// is erased right after.
    fn on_merge(&mut self, _other: &mut Self) {}

    /// Called when a cell is disconnected in two; `other` is the fresh copy
    /// attached to the new piece.
    fn on_split(&mut self, _other: &mut Self) {}
}

impl CellInfo for () {}

macro_rules! plain_cell_info {
    ($($t:ty),* $(,)?) => {
        $(impl CellInfo for $t {})*
    };
}

plain_cell_info!(bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, String);

/// Dynamic hook replacing the static one for a dimension.
pub type HookFn<T> = Rc<dyn Fn(&mut T, &mut T)>;

/// Per-dimension attribute options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeConfig {
    /// Edit operations attach a default-constructed attribute to each new
    /// cell that ends up without one.
    pub auto_create: bool,
}

impl AttributeConfig {
    pub fn auto_create() -> Self {
        Self { auto_create: true }
    }
}

/// One attribute: payload, representative dart and reference count.
#[derive(Clone, Debug)]
pub struct CellAttribute<T> {
    info: T,
    dart: Option<DartHandle>,
    ref_count: usize,
}

impl<T> CellAttribute<T> {
    fn new(info: T) -> Self {
        Self {
            info,
            dart: None,
            ref_count: 0,
        }
    }

    pub fn info(&self) -> &T {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut T {
        &mut self.info
    }

    /// One dart of the described cell, if the type stores one.
    pub fn dart(&self) -> Option<DartHandle> {
        self.dart
    }

    /// Number of darts referencing this attribute.
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }
}

/// Type-erased capability set of one dimension's attribute collection.
pub trait AttributeStore: fmt::Debug {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn contains(&self, handle: AttributeHandle) -> bool;
    fn handles(&self) -> Vec<AttributeHandle>;
    fn create_default(&mut self) -> AttributeHandle;
    /// Clone the payload of `handle` into a fresh, unreferenced attribute.
    fn duplicate(&mut self, handle: AttributeHandle) -> Option<AttributeHandle>;
    fn erase(&mut self, handle: AttributeHandle) -> bool;
    fn dart_of(&self, handle: AttributeHandle) -> Option<DartHandle>;
    fn set_dart_of(&mut self, handle: AttributeHandle, dart: Option<DartHandle>);
    fn ref_count(&self, handle: AttributeHandle) -> usize;
    fn set_ref_count(&mut self, handle: AttributeHandle, count: usize);
    fn increment(&mut self, handle: AttributeHandle);
    /// Decrement and return the remaining count.
    fn decrement(&mut self, handle: AttributeHandle) -> usize;
    fn fire_merge(&mut self, survivor: AttributeHandle, absorbed: AttributeHandle);
    fn fire_split(&mut self, original: AttributeHandle, copy: AttributeHandle);
    fn supports_cell_dart(&self) -> bool;
    fn config(&self) -> AttributeConfig;
    fn info_type_name(&self) -> &'static str;
    fn clear(&mut self);
    fn clone_box(&self) -> Box<dyn AttributeStore>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn AttributeStore> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Arena of `T`-attributes for one dimension.
pub struct AttributeArena<T: CellInfo> {
    attributes: SlotMap<AttributeHandle, CellAttribute<T>>,
    config: AttributeConfig,
    on_merge: Option<HookFn<T>>,
    on_split: Option<HookFn<T>>,
}

impl<T: CellInfo> AttributeArena<T> {
    pub fn new(config: AttributeConfig) -> Self {
        Self {
            attributes: SlotMap::with_key(),
            config,
            on_merge: None,
            on_split: None,
        }
    }

    pub fn insert(&mut self, info: T) -> AttributeHandle {
        self.attributes.insert(CellAttribute::new(info))
    }

    pub fn get(&self, handle: AttributeHandle) -> Option<&CellAttribute<T>> {
        self.attributes.get(handle)
    }

    pub fn get_mut(&mut self, handle: AttributeHandle) -> Option<&mut CellAttribute<T>> {
        self.attributes.get_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeHandle, &CellAttribute<T>)> {
        self.attributes.iter()
    }

    pub fn set_on_merge(&mut self, hook: Option<HookFn<T>>) {
        self.on_merge = hook;
    }

    pub fn set_on_split(&mut self, hook: Option<HookFn<T>>) {
        self.on_split = hook;
    }

    pub fn has_dynamic_merge(&self) -> bool {
        self.on_merge.is_some()
    }

    pub fn has_dynamic_split(&self) -> bool {
        self.on_split.is_some()
    }
}

impl<T: CellInfo> Clone for AttributeArena<T> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            config: self.config,
            on_merge: self.on_merge.clone(),
            on_split: self.on_split.clone(),
        }
    }
}

impl<T: CellInfo> fmt::Debug for AttributeArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeArena")
            .field("info", &std::any::type_name::<T>())
            .field("len", &self.attributes.len())
            .field("config", &self.config)
            .field("dynamic_on_merge", &self.on_merge.is_some())
            .field("dynamic_on_split", &self.on_split.is_some())
            .finish()
    }
}

impl<T: CellInfo> AttributeStore for AttributeArena<T> {
    fn len(&self) -> usize {
        self.attributes.len()
    }

    fn contains(&self, handle: AttributeHandle) -> bool {
        self.attributes.contains_key(handle)
    }

    fn handles(&self) -> Vec<AttributeHandle> {
        self.attributes.keys().collect()
    }

    fn create_default(&mut self) -> AttributeHandle {
        self.insert(T::default())
    }

    fn duplicate(&mut self, handle: AttributeHandle) -> Option<AttributeHandle> {
        let info = self.attributes.get(handle)?.info.clone();
        Some(self.insert(info))
    }

    fn erase(&mut self, handle: AttributeHandle) -> bool {
        self.attributes.remove(handle).is_some()
    }

    fn dart_of(&self, handle: AttributeHandle) -> Option<DartHandle> {
        self.attributes.get(handle).and_then(|a| a.dart)
    }

    fn set_dart_of(&mut self, handle: AttributeHandle, dart: Option<DartHandle>) {
        if !T::SUPPORTS_CELL_DART {
            return;
        }
        if let Some(a) = self.attributes.get_mut(handle) {
            a.dart = dart;
        }
    }

    fn ref_count(&self, handle: AttributeHandle) -> usize {
        self.attributes.get(handle).map_or(0, |a| a.ref_count)
    }

    fn set_ref_count(&mut self, handle: AttributeHandle, count: usize) {
        if let Some(a) = self.attributes.get_mut(handle) {
            a.ref_count = count;
        }
    }

    fn increment(&mut self, handle: AttributeHandle) {
        if let Some(a) = self.attributes.get_mut(handle) {
            a.ref_count += 1;
        }
    }

    fn decrement(&mut self, handle: AttributeHandle) -> usize {
        match self.attributes.get_mut(handle) {
            Some(a) => {
                a.ref_count = a.ref_count.saturating_sub(1);
                a.ref_count
            }
            None => 0,
        }
    }

    fn fire_merge(&mut self, survivor: AttributeHandle, absorbed: AttributeHandle) {
        let Some([a, b]) = self.attributes.get_disjoint_mut([survivor, absorbed]) else {
            return;
        };
        match &self.on_merge {
            Some(hook) => hook(&mut a.info, &mut b.info),
            None => a.info.on_merge(&mut b.info),
        }
    }

    fn fire_split(&mut self, original: AttributeHandle, copy: AttributeHandle) {
        let Some([a, b]) = self.attributes.get_disjoint_mut([original, copy]) else {
            return;
        };
        match &self.on_split {
            Some(hook) => hook(&mut a.info, &mut b.info),
            None => a.info.on_split(&mut b.info),
        }
    }

    fn supports_cell_dart(&self) -> bool {
        T::SUPPORTS_CELL_DART
    }

    fn config(&self) -> AttributeConfig {
        self.config
    }

    fn info_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn clear(&mut self) {
        self.attributes.clear();
    }

    fn clone_box(&self) -> Box<dyn AttributeStore> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
