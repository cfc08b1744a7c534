//! Caller-supplied access to each side's store.
//!
//! The engine never touches a store directly. Each side is reached through
//! a [`SideAdapter`] (get / insert / update / delete), and items cross sides
//! through the [`Converters`] pair. All callbacks report failure through
//! `anyhow::Result`; the engine decides whether a failure is isolated or
//! aborts the run.

use crate::models::Identifier;

// ---------------------------------------------------------------------------
// Side adapter
// ---------------------------------------------------------------------------

/// Store operations for one side.
pub trait SideAdapter {
    type Id: Identifier;
    type Item;

    /// Fetch an item. `Ok(None)` means the item is not in the store, which
    /// is an expected outcome and not a failure.
    fn get(&self, id: &Self::Id) -> anyhow::Result<Option<Self::Item>>;

    /// Insert an item and return the identifier the store assigned to it.
    fn insert(&mut self, item: Self::Item) -> anyhow::Result<Self::Id>;

    /// Replace the item stored under `id`.
    fn update(&mut self, id: &Self::Id, item: Self::Item) -> anyhow::Result<()>;

    /// Remove the item stored under `id`.
    fn delete(&mut self, id: &Self::Id) -> anyhow::Result<()>;
}

impl<T: SideAdapter + ?Sized> SideAdapter for &mut T {
    type Id = T::Id;
    type Item = T::Item;

    fn get(&self, id: &Self::Id) -> anyhow::Result<Option<Self::Item>> {
        (**self).get(id)
    }

    fn insert(&mut self, item: Self::Item) -> anyhow::Result<Self::Id> {
        (**self).insert(item)
    }

    fn update(&mut self, id: &Self::Id, item: Self::Item) -> anyhow::Result<()> {
        (**self).update(id, item)
    }

    fn delete(&mut self, id: &Self::Id) -> anyhow::Result<()> {
        (**self).delete(id)
    }
}

// ---------------------------------------------------------------------------
// Closure-backed adapter
// ---------------------------------------------------------------------------

type GetFn<Id, Item> = Box<dyn Fn(&Id) -> anyhow::Result<Option<Item>>>;
type InsertFn<Id, Item> = Box<dyn FnMut(Item) -> anyhow::Result<Id>>;
type UpdateFn<Id, Item> = Box<dyn FnMut(&Id, Item) -> anyhow::Result<()>>;
type DeleteFn<Id> = Box<dyn FnMut(&Id) -> anyhow::Result<()>>;

/// A [`SideAdapter`] assembled from four closures.
pub struct FnSide<Id, Item> {
    getter: GetFn<Id, Item>,
    inserter: InsertFn<Id, Item>,
    updater: UpdateFn<Id, Item>,
    deleter: DeleteFn<Id>,
}

impl<Id: Identifier, Item> FnSide<Id, Item> {
    pub fn new<G, I, U, D>(getter: G, inserter: I, updater: U, deleter: D) -> Self
    where
        G: Fn(&Id) -> anyhow::Result<Option<Item>> + 'static,
        I: FnMut(Item) -> anyhow::Result<Id> + 'static,
        U: FnMut(&Id, Item) -> anyhow::Result<()> + 'static,
        D: FnMut(&Id) -> anyhow::Result<()> + 'static,
    {
        Self {
            getter: Box::new(getter),
            inserter: Box::new(inserter),
            updater: Box::new(updater),
            deleter: Box::new(deleter),
        }
    }
}

impl<Id: Identifier, Item> SideAdapter for FnSide<Id, Item> {
    type Id = Id;
    type Item = Item;

    fn get(&self, id: &Id) -> anyhow::Result<Option<Item>> {
        (self.getter)(id)
    }

    fn insert(&mut self, item: Item) -> anyhow::Result<Id> {
        (self.inserter)(item)
    }

    fn update(&mut self, id: &Id, item: Item) -> anyhow::Result<()> {
        (self.updater)(id, item)
    }

    fn delete(&mut self, id: &Id) -> anyhow::Result<()> {
        (self.deleter)(id)
    }
}

// ---------------------------------------------------------------------------
// Converters
// ---------------------------------------------------------------------------

/// Converts an item into the other side's representation. `Ok(None)` skips
/// the item.
pub type ConvertFn<From, To> = Box<dyn Fn(&From) -> anyhow::Result<Option<To>>>;

/// The A -> B and B -> A conversion callbacks.
pub struct Converters<ItemA, ItemB> {
    to_a: ConvertFn<ItemB, ItemA>,
    to_b: ConvertFn<ItemA, ItemB>,
}

impl<ItemA, ItemB> Converters<ItemA, ItemB> {
    pub fn new<FA, FB>(to_a: FA, to_b: FB) -> Self
    where
        FA: Fn(&ItemB) -> anyhow::Result<Option<ItemA>> + 'static,
        FB: Fn(&ItemA) -> anyhow::Result<Option<ItemB>> + 'static,
    {
        Self {
            to_a: Box::new(to_a),
            to_b: Box::new(to_b),
        }
    }

    /// Converters that never skip and never fail.
    pub fn infallible<FA, FB>(to_a: FA, to_b: FB) -> Self
    where
        FA: Fn(&ItemB) -> ItemA + 'static,
        FB: Fn(&ItemA) -> ItemB + 'static,
    {
        Self::new(move |b| Ok(Some(to_a(b))), move |a| Ok(Some(to_b(a))))
    }

    pub fn to_a(&self, item: &ItemB) -> anyhow::Result<Option<ItemA>> {
        (self.to_a)(item)
    }

    pub fn to_b(&self, item: &ItemA) -> anyhow::Result<Option<ItemB>> {
        (self.to_b)(item)
    }
}
