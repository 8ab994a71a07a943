use std::cmp::Ordering;

use super::TranslationStore;

/// Total order over stores, highest priority first.
///
/// Stores are sorted by descending [`TranslationStore::order`], then by
/// ascending service name. `None` sorts after every store.
#[must_use]
pub fn compare_stores(a: Option<&dyn TranslationStore>, b: Option<&dyn TranslationStore>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => b
            .order()
            .total_cmp(&a.order())
            .then_with(|| a.service().name().cmp(b.service().name())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::store::MemoryTranslationStore;
    use crate::test_utils::memory_store;

    fn store(name: &str, order: f64) -> MemoryTranslationStore {
        memory_store(name, order, true, &[])
    }

    #[rstest]
    #[case::higher_order_first("a", 10.0, "b", 5.0, Ordering::Less)]
    #[case::lower_order_last("a", 5.0, "b", 10.0, Ordering::Greater)]
    #[case::tie_by_name("a", 5.0, "b", 5.0, Ordering::Less)]
    #[case::tie_by_name_reverse("b", 5.0, "a", 5.0, Ordering::Greater)]
    #[case::equal("a", 5.0, "a", 5.0, Ordering::Equal)]
    fn compares_order_then_name(
        #[case] a_name: &str,
        #[case] a_order: f64,
        #[case] b_name: &str,
        #[case] b_order: f64,
        #[case] expected: Ordering,
    ) {
        let a = store(a_name, a_order);
        let b = store(b_name, b_order);

        assert_that!(compare_stores(Some(&a), Some(&b)), eq(expected));
    }

    #[rstest]
    fn none_sorts_last() {
        let a = store("a", 0.0);

        assert_that!(compare_stores(None, Some(&a)), eq(Ordering::Greater));
        assert_that!(compare_stores(Some(&a), None), eq(Ordering::Less));
        assert_that!(compare_stores(None, None), eq(Ordering::Equal));
    }

    #[rstest]
    fn sorts_highest_priority_first() {
        let stores = [store("low", -1.0), store("b", 3.0), store("a", 3.0), store("high", 30.0)];
        let mut refs: Vec<&dyn TranslationStore> =
            stores.iter().map(|s| s as &dyn TranslationStore).collect();

        refs.sort_by(|a, b| compare_stores(Some(*a), Some(*b)));

        let names: Vec<&str> = refs.iter().map(|s| s.service().name()).collect();
        assert_eq!(names, ["high", "a", "b", "low"]);
    }
}
