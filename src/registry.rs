//! Store registry.
//!
//! Suppliers produce the stores relevant to a scope. The registry
//! aggregates them into stacks and reports stores that override each other
//! without a priority difference.

/// Supplier discovering file-backed stores
pub mod file_supplier;

use std::collections::{
    BTreeSet,
    HashMap,
    HashSet,
};
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use crate::progress::CancellationToken;
use crate::stack::{
    StackError,
    StoreSource,
    TranslationStoreStack,
};
use crate::store::{
    StoreError,
    StoreId,
    TranslationStore,
};

pub use file_supplier::FileStoreSupplier;

/// Produces stores for a scope.
pub trait TranslationStoreSupplier: fmt::Debug + Send + Sync {
    /// Stable identity of the supplier.
    fn id(&self) -> &str;

    /// Stores relevant to `scope`. May be empty.
    fn stores(
        &self,
        scope: &Path,
        token: &CancellationToken,
    ) -> Result<Vec<Box<dyn TranslationStore>>, StoreError>;

    /// Resolves the store of a single service.
    fn store_for_service(
        &self,
        _service: &StoreId,
        _token: &CancellationToken,
    ) -> Result<Option<Box<dyn TranslationStore>>, StoreError> {
        Ok(None)
    }
}

/// Registered suppliers, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TranslationStores {
    /// Registered suppliers
    suppliers: Vec<Arc<dyn TranslationStoreSupplier>>,
}

impl TranslationStores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `supplier`.
    ///
    /// Returns `false` if this instance is already registered. A different
    /// supplier with the same id replaces the registered one.
    pub fn register(&mut self, supplier: Arc<dyn TranslationStoreSupplier>) -> bool {
        if self.suppliers.iter().any(|s| Arc::ptr_eq(s, &supplier)) {
            return false;
        }
        if let Some(existing) = self.suppliers.iter_mut().find(|s| s.id() == supplier.id()) {
            tracing::warn!(id = supplier.id(), "Replacing translation store supplier");
            *existing = supplier;
            return true;
        }
        tracing::debug!(id = supplier.id(), "Registered translation store supplier");
        self.suppliers.push(supplier);
        true
    }

    /// Unregisters the supplier with `id`.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.suppliers.len();
        self.suppliers.retain(|s| s.id() != id);
        self.suppliers.len() != before
    }

    pub fn suppliers(&self) -> impl Iterator<Item = &Arc<dyn TranslationStoreSupplier>> {
        self.suppliers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    /// Stores of all suppliers for `scope`.
    ///
    /// If two suppliers return a store for the same service, the store of
    /// the supplier registered first is kept.
    pub fn all_stores(
        &self,
        scope: &Path,
        token: &CancellationToken,
    ) -> Result<Vec<Box<dyn TranslationStore>>, StoreError> {
        collect_stores(&self.suppliers, scope, token)
    }

    /// Stack over all stores of `scope`, or `None` if there are none.
    ///
    /// The stack asks the suppliers again on reload.
    pub fn create_full_stack(
        &self,
        scope: &Path,
        token: &CancellationToken,
    ) -> Result<Option<TranslationStoreStack>, StackError> {
        self.create_stack(scope, token, |_: &dyn TranslationStore| true)
    }

    /// Stack over the stores of `scope` accepted by `filter`, or `None` if
    /// there are none.
    pub fn create_stack<F>(
        &self,
        scope: &Path,
        token: &CancellationToken,
        filter: F,
    ) -> Result<Option<TranslationStoreStack>, StackError>
    where
        F: Fn(&dyn TranslationStore) -> bool + Send + 'static,
    {
        let source = RegistrySource {
            suppliers: self.suppliers.clone(),
            scope: scope.to_path_buf(),
            filter: Box::new(filter),
        };
        let stack = TranslationStoreStack::with_source(source, token)?;
        if stack.all_stores().next().is_none() {
            tracing::debug!(scope = %scope.display(), "No translation stores found");
            return Ok(None);
        }
        Ok(Some(stack))
    }

    /// Store of `service` from the first supplier that knows it.
    pub fn create_store_for_service(
        &self,
        service: &StoreId,
        token: &CancellationToken,
    ) -> Result<Option<Box<dyn TranslationStore>>, StoreError> {
        for supplier in &self.suppliers {
            token.check()?;
            if let Some(store) = supplier.store_for_service(service, token)? {
                return Ok(Some(store));
            }
        }
        Ok(None)
    }
}

/// Union of the stores of `suppliers`, first service wins.
fn collect_stores(
    suppliers: &[Arc<dyn TranslationStoreSupplier>],
    scope: &Path,
    token: &CancellationToken,
) -> Result<Vec<Box<dyn TranslationStore>>, StoreError> {
    let mut seen = HashSet::new();
    let mut stores = Vec::new();
    for supplier in suppliers {
        token.check()?;
        for store in supplier.stores(scope, token)? {
            if seen.insert(store.service().clone()) {
                stores.push(store);
            } else {
                tracing::warn!(
                    supplier = supplier.id(),
                    service = %store.service(),
                    "Ignoring store for already supplied service"
                );
            }
        }
    }
    Ok(stores)
}

/// Re-fetches the stores of a stack created by the registry.
struct RegistrySource {
    /// Suppliers at stack creation
    suppliers: Vec<Arc<dyn TranslationStoreSupplier>>,
    /// Scope the stack was created for
    scope: PathBuf,
    /// Store filter
    filter: Box<dyn Fn(&dyn TranslationStore) -> bool + Send>,
}

impl StoreSource for RegistrySource {
    fn fetch(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Box<dyn TranslationStore>>, StoreError> {
        let mut stores = collect_stores(&self.suppliers, &self.scope, token)?;
        stores.retain(|store| (self.filter)(store.as_ref()));
        Ok(stores)
    }
}

/// Groups of equal-priority stores that define at least one common key.
///
/// Stores are grouped transitively: if A and B share a key and B and C share
/// another, A, B and C form one group. Groups are sorted; single stores are
/// left out.
#[must_use]
pub fn stores_having_implicit_overrides(
    stores: &[Box<dyn TranslationStore>],
) -> Vec<BTreeSet<StoreId>> {
    let mut by_order: HashMap<u64, Vec<&dyn TranslationStore>> = HashMap::new();
    for store in stores {
        by_order.entry(order_bits(store.order())).or_default().push(store.as_ref());
    }

    let mut groups: Vec<BTreeSet<StoreId>> = by_order
        .into_values()
        .filter(|bucket| bucket.len() > 1)
        .flat_map(|bucket| overlapping_groups(&bucket))
        .collect();
    groups.sort();
    groups.dedup();
    groups
}

/// Bucket key of an order. `-0.0` and `0.0` are the same priority.
fn order_bits(order: f64) -> u64 {
    if order == 0.0 { 0.0_f64.to_bits() } else { order.to_bits() }
}

/// Connected components of stores linked by shared keys.
fn overlapping_groups(bucket: &[&dyn TranslationStore]) -> Vec<BTreeSet<StoreId>> {
    let mut parent: Vec<usize> = (0..bucket.len()).collect();
    let mut first_owner: HashMap<&str, usize> = HashMap::new();

    for (index, store) in bucket.iter().enumerate() {
        for key in store.keys() {
            match first_owner.get(key) {
                Some(&owner) => union(&mut parent, owner, index),
                None => {
                    first_owner.insert(key, index);
                }
            }
        }
    }

    let mut components: HashMap<usize, BTreeSet<StoreId>> = HashMap::new();
    for (index, store) in bucket.iter().enumerate() {
        let root = find(&mut parent, index);
        components.entry(root).or_default().insert(store.service().clone());
    }
    components.into_values().filter(|group| group.len() > 1).collect()
}

/// Root of `index` with path halving.
fn find(parent: &mut [usize], mut index: usize) -> usize {
    while let Some(&next) = parent.get(index) {
        if next == index {
            break;
        }
        let grand = parent.get(next).copied().unwrap_or(next);
        if let Some(slot) = parent.get_mut(index) {
            *slot = grand;
        }
        index = grand;
    }
    index
}

/// Merges the sets of `a` and `b`.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a != root_b
        && let Some(slot) = parent.get_mut(root_b)
    {
        *slot = root_a;
    }
}
