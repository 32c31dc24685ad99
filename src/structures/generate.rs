//! Value generation for composite structures and the array-to-tree fold.

use super::options::{Comparator, GenerationKind, SortMode, StructureOptions};
use crate::error::SceneError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const DEFAULT_COUNT: usize = 9;

/// Value carried by an array cell, list element or tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(i64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Numeric reading used for sorting; text is parsed leniently.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub enum Order {
    #[default]
    Keep,
    Shuffle,
    Sorted,
    Custom(Comparator),
}

/// Generation settings with defaults already applied.
#[derive(Debug, Clone)]
pub struct Generation {
    pub kind: GenerationKind,
    pub num: Option<usize>,
    pub min: i64,
    pub max: Option<i64>,
    pub order: Order,
}

impl Generation {
    pub fn resolve(options: &StructureOptions, has_values: bool) -> Result<Self, SceneError> {
        let kind = match options.kind {
            Some(kind) => kind,
            None if has_values => GenerationKind::Param,
            None => return Err(SceneError::MissingOption("type")),
        };
        let order = match (&options.comparator, options.sort) {
            (Some(comparator), _) => Order::Custom(comparator.clone()),
            (None, Some(SortMode::Shuffle)) => Order::Shuffle,
            (None, Some(SortMode::Sorted)) => Order::Sorted,
            (None, None) => Order::Keep,
        };
        Ok(Self {
            kind,
            // zero counts fall back like an absent count
            num: options.num.filter(|n| *n > 0),
            min: options.min.unwrap_or(0),
            max: options.max,
            order,
        })
    }

    pub fn count(&self) -> usize {
        self.num.unwrap_or(DEFAULT_COUNT)
    }
}

/// Produces the values a structure is built from.
pub fn generate_values<R: Rng>(
    generation: &Generation,
    supplied: Option<&[CellValue]>,
    rng: &mut R,
) -> Result<Vec<CellValue>, SceneError> {
    let mut values = match (generation.kind, supplied) {
        (_, Some(values)) => values.to_vec(),
        (GenerationKind::Param, None) => return Err(SceneError::MissingOption("values")),
        (GenerationKind::Succeeding, None) => {
            let span = generation
                .max
                .map(|max| max - generation.min)
                .filter(|span| *span > 0)
                .map(|span| span as usize);
            let len = generation.num.or(span).unwrap_or(DEFAULT_COUNT);
            (0..len as i64)
                .map(|i| CellValue::Number(generation.min + i))
                .collect()
        }
        (GenerationKind::Random, None) => {
            let len = generation.count();
            let max = generation.max.unwrap_or(len as i64);
            if max <= generation.min {
                return Err(SceneError::InvalidOption {
                    field: "max",
                    reason: format!("random range [{}, {max}) is empty", generation.min),
                });
            }
            (0..len)
                .map(|_| CellValue::Number(rng.random_range(generation.min..max)))
                .collect()
        }
        (GenerationKind::Empty, None) => vec![CellValue::empty(); generation.count()],
    };

    match &generation.order {
        Order::Keep => {}
        Order::Shuffle => shuffle(&mut values, rng),
        Order::Sorted => sort_numeric(&mut values),
        Order::Custom(comparator) => values.sort_by(|a, b| comparator.compare(a, b)),
    }
    Ok(values)
}

/// Fisher–Yates, in place.
pub fn shuffle<T, R: Rng>(values: &mut [T], rng: &mut R) {
    for i in (1..values.len()).rev() {
        let j = rng.random_range(0..=i);
        values.swap(i, j);
    }
}

/// Stable ascending sort by numeric value; non-numeric values go last.
pub fn sort_numeric(values: &mut [CellValue]) {
    values.sort_by(|a, b| match (a.as_number(), b.as_number()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Nested `{value, left, right}` description of a binary tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSpec {
    #[serde(alias = "val")]
    pub value: CellValue,
    #[serde(default)]
    pub left: Option<Box<TreeSpec>>,
    #[serde(default)]
    pub right: Option<Box<TreeSpec>>,
}

impl TreeSpec {
    pub fn leaf(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            left: None,
            right: None,
        }
    }

    /// Number of nodes in this subtree.
    pub fn count(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |l| l.count()) + self.right.as_ref().map_or(0, |r| r.count())
    }
}

/// Folds `values[from..to]` into a height-balanced tree by taking the
/// midpoint as root. Yields a search tree only when the input is sorted.
pub fn array_to_tree(values: &[CellValue], from: usize, to: usize) -> Option<Box<TreeSpec>> {
    if from >= to || to > values.len() {
        return None;
    }
    let mid = (from + to) / 2;
    Some(Box::new(TreeSpec {
        value: values[mid].clone(),
        left: array_to_tree(values, from, mid),
        right: array_to_tree(values, mid + 1, to),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn options(kind: GenerationKind) -> StructureOptions {
        StructureOptions {
            kind: Some(kind),
            ..Default::default()
        }
    }

    fn numbers(values: &[CellValue]) -> Vec<i64> {
        values.iter().filter_map(CellValue::as_number).collect()
    }

    #[test]
    fn succeeding_counts_up_from_min() {
        let mut rng = StdRng::seed_from_u64(1);
        let opts = StructureOptions {
            min: Some(3),
            num: Some(4),
            ..options(GenerationKind::Succeeding)
        };
        let generation = Generation::resolve(&opts, false).unwrap();
        let values = generate_values(&generation, None, &mut rng).unwrap();
        assert_eq!(numbers(&values), vec![3, 4, 5, 6]);
    }

    #[test]
    fn succeeding_length_falls_back_to_range_then_default() {
        let mut rng = StdRng::seed_from_u64(1);
        let ranged = StructureOptions {
            min: Some(2),
            max: Some(5),
            ..options(GenerationKind::Succeeding)
        };
        let generation = Generation::resolve(&ranged, false).unwrap();
        assert_eq!(numbers(&generate_values(&generation, None, &mut rng).unwrap()), vec![2, 3, 4]);

        let generation = Generation::resolve(&options(GenerationKind::Succeeding), false).unwrap();
        assert_eq!(generate_values(&generation, None, &mut rng).unwrap().len(), 9);
    }

    #[test]
    fn random_stays_in_half_open_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = StructureOptions {
            min: Some(0),
            max: Some(10),
            num: Some(5),
            ..options(GenerationKind::Random)
        };
        let generation = Generation::resolve(&opts, false).unwrap();
        for _ in 0..50 {
            let values = generate_values(&generation, None, &mut rng).unwrap();
            assert_eq!(values.len(), 5);
            assert!(numbers(&values).iter().all(|v| (0..10).contains(v)));
        }
    }

    #[test]
    fn random_with_empty_range_is_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = StructureOptions {
            min: Some(5),
            max: Some(5),
            ..options(GenerationKind::Random)
        };
        let generation = Generation::resolve(&opts, false).unwrap();
        assert!(matches!(
            generate_values(&generation, None, &mut rng),
            Err(SceneError::InvalidOption { field: "max", .. })
        ));
    }

    #[test]
    fn empty_yields_blank_placeholders() {
        let mut rng = StdRng::seed_from_u64(1);
        let opts = StructureOptions {
            num: Some(3),
            ..options(GenerationKind::Empty)
        };
        let generation = Generation::resolve(&opts, false).unwrap();
        assert_eq!(
            generate_values(&generation, None, &mut rng).unwrap(),
            vec![CellValue::empty(); 3]
        );
    }

    #[test]
    fn sorted_is_non_decreasing_for_every_mode() {
        let mut rng = StdRng::seed_from_u64(3);
        for kind in [GenerationKind::Random, GenerationKind::Succeeding] {
            let opts = StructureOptions {
                num: Some(12),
                max: Some(40),
                sort: Some(SortMode::Sorted),
                ..options(kind)
            };
            let generation = Generation::resolve(&opts, false).unwrap();
            let values = numbers(&generate_values(&generation, None, &mut rng).unwrap());
            assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        }

        let supplied: Vec<CellValue> = vec![9.into(), "x".into(), 2.into(), " 5".into()];
        let opts = StructureOptions {
            sort: Some(SortMode::Sorted),
            ..Default::default()
        };
        let generation = Generation::resolve(&opts, true).unwrap();
        let values = generate_values(&generation, Some(&supplied), &mut rng).unwrap();
        assert_eq!(values, vec![2.into(), " 5".into(), 9.into(), "x".into()]);
    }

    #[test]
    fn shuffle_is_a_restartable_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let original: Vec<i64> = (0..20).collect();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5 {
            let mut values = original.clone();
            shuffle(&mut values, &mut rng);
            let mut sorted = values.clone();
            sorted.sort();
            assert_eq!(sorted, original);
            seen.insert(values);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn comparator_orders_values() {
        let mut rng = StdRng::seed_from_u64(1);
        let opts = StructureOptions {
            num: Some(4),
            comparator: Some(Comparator::new(|a: &CellValue, b: &CellValue| {
                b.as_number().cmp(&a.as_number())
            })),
            ..options(GenerationKind::Succeeding)
        };
        let generation = Generation::resolve(&opts, false).unwrap();
        assert_eq!(numbers(&generate_values(&generation, None, &mut rng).unwrap()), vec![3, 2, 1, 0]);
    }

    #[test]
    fn missing_type_without_values_is_a_configuration_error() {
        assert!(matches!(
            Generation::resolve(&StructureOptions::default(), false),
            Err(SceneError::MissingOption("type"))
        ));
        assert!(Generation::resolve(&StructureOptions::default(), true).is_ok());
    }

    #[test]
    fn array_to_tree_splits_at_midpoint() {
        let values: Vec<CellValue> = (1..=5).map(CellValue::Number).collect();
        let root = array_to_tree(&values, 0, values.len()).unwrap();
        assert_eq!(root.value, CellValue::Number(3));
        let left = root.left.as_ref().unwrap();
        let right = root.right.as_ref().unwrap();
        assert_eq!(left.value, CellValue::Number(2));
        assert_eq!(left.left.as_ref().unwrap().value, CellValue::Number(1));
        assert!(left.right.is_none());
        assert_eq!(right.value, CellValue::Number(5));
        assert_eq!(right.left.as_ref().unwrap().value, CellValue::Number(4));
        assert_eq!(root.count(), 5);
        assert!(array_to_tree(&values, 2, 2).is_none());
    }
}
