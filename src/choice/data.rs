//! Choice data: a design matrix partitioned into choice tasks.

use crate::error::{Error, Result};
use crate::linalg::rows_to_array;
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;

/// One choice task: the alternatives shown together and the one picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceGroup {
    /// Caller-supplied group id.
    pub id: usize,
    /// Row indices of the alternatives, in input order.
    pub rows: Vec<usize>,
    /// Position of the chosen alternative within `rows`.
    pub chosen: usize,
}

impl ChoiceGroup {
    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a validated group.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row index of the chosen alternative.
    pub fn chosen_row(&self) -> usize {
        self.rows[self.chosen]
    }
}

/// Validated choice data.
///
/// Rows are alternatives; `chosen[i]` marks the picked row and `group_ids[i]`
/// says which task row i belongs to. Groups need not be contiguous and may
/// differ in size, but each has at least two alternatives and exactly one
/// chosen row. Groups are kept in order of first appearance.
#[derive(Debug, Clone)]
pub struct ChoiceData {
    x: Array2<f64>,
    chosen: Vec<bool>,
    group_ids: Vec<usize>,
    groups: Vec<ChoiceGroup>,
    feature_names: Vec<String>,
}

impl ChoiceData {
    /// Validate and group the rows.
    pub fn new(x: Array2<f64>, chosen: Vec<bool>, group_ids: Vec<usize>) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(Error::InvalidInput("no rows".to_string()));
        }
        if x.ncols() == 0 {
            return Err(Error::InvalidInput("design matrix has no columns".to_string()));
        }
        if chosen.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: chosen.len(),
            });
        }
        if group_ids.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: group_ids.len(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(
                "design matrix contains a non-finite value".to_string(),
            ));
        }

        let groups = build_groups(&chosen, &group_ids)?;
        let feature_names = (1..=x.ncols()).map(|j| format!("x{j}")).collect();

        Ok(Self {
            x,
            chosen,
            group_ids,
            groups,
            feature_names,
        })
    }

    /// Same as [`ChoiceData::new`], from row vectors.
    pub fn from_rows(rows: &[Vec<f64>], chosen: Vec<bool>, group_ids: Vec<usize>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidInput("no rows".to_string()));
        }
        Self::new(rows_to_array(rows)?, chosen, group_ids)
    }

    /// Name the design columns.
    pub fn with_feature_names<S: Into<String>>(mut self, names: Vec<S>) -> Result<Self> {
        if names.len() != self.n_features() {
            return Err(Error::DimensionMismatch {
                expected: self.n_features(),
                found: names.len(),
            });
        }
        self.feature_names = names.into_iter().map(Into::into).collect();
        Ok(self)
    }

    /// Design matrix, one row per alternative.
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Chosen indicator per row.
    pub fn chosen(&self) -> &[bool] {
        &self.chosen
    }

    /// Group id per row.
    pub fn group_ids(&self) -> &[usize] {
        &self.group_ids
    }

    /// Choice tasks in order of first appearance.
    pub fn groups(&self) -> &[ChoiceGroup] {
        &self.groups
    }

    /// Column names.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of alternatives across all groups.
    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    /// Number of design columns (length of β).
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of choice tasks.
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }
}

/// Row indices per group id, groups in order of first appearance.
pub(crate) fn group_rows(group_ids: &[usize]) -> Vec<(usize, Vec<usize>)> {
    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut out: Vec<(usize, Vec<usize>)> = Vec::new();
    for (row, &id) in group_ids.iter().enumerate() {
        let idx = *slot.entry(id).or_insert_with(|| {
            out.push((id, Vec::new()));
            out.len() - 1
        });
        out[idx].1.push(row);
    }
    out
}

fn build_groups(chosen: &[bool], group_ids: &[usize]) -> Result<Vec<ChoiceGroup>> {
    let mut groups: Vec<ChoiceGroup> = group_rows(group_ids)
        .into_iter()
        .map(|(id, rows)| ChoiceGroup { id, rows, chosen: 0 })
        .collect();

    for group in &mut groups {
        if group.rows.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "group {} has {} alternative(s), need at least 2",
                group.id,
                group.rows.len()
            )));
        }
        let indicators: Vec<bool> = group.rows.iter().map(|&r| chosen[r]).collect();
        group.chosen = decode_one_hot(&indicators).map_err(|_| {
            Error::InvalidInput(format!(
                "group {} has {} chosen alternatives, expected exactly 1",
                group.id,
                indicators.iter().filter(|&&c| c).count()
            ))
        })?;
    }

    Ok(groups)
}

/// Encode a chosen index as an indicator vector over `n_alternatives`.
pub fn one_hot(index: usize, n_alternatives: usize) -> Result<Vec<bool>> {
    if n_alternatives < 2 {
        return Err(Error::InvalidParameter {
            name: "n_alternatives",
            message: "must be >= 2",
        });
    }
    if index >= n_alternatives {
        return Err(Error::InvalidParameter {
            name: "index",
            message: "must be < n_alternatives",
        });
    }
    let mut out = vec![false; n_alternatives];
    out[index] = true;
    Ok(out)
}

/// Recover the chosen index from an indicator vector with exactly one `true`.
pub fn decode_one_hot(indicators: &[bool]) -> Result<usize> {
    let mut set = indicators.iter().enumerate().filter(|(_, &c)| c).map(|(i, _)| i);
    match (set.next(), set.next()) {
        (Some(i), None) => Ok(i),
        (None, _) => Err(Error::InvalidInput("no alternative is chosen".to_string())),
        (Some(_), Some(_)) => Err(Error::InvalidInput(
            "more than one alternative is chosen".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn groups_follow_first_appearance() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let data = ChoiceData::new(
            x,
            vec![false, true, true, false, false],
            vec![7, 3, 7, 3, 3],
        )
        .unwrap();

        assert_eq!(data.n_groups(), 2);
        assert_eq!(data.groups()[0].id, 7);
        assert_eq!(data.groups()[0].rows, vec![0, 2]);
        assert_eq!(data.groups()[0].chosen_row(), 2);
        assert_eq!(data.groups()[1].rows, vec![1, 3, 4]);
        assert_eq!(data.groups()[1].chosen_row(), 1);
    }

    #[test]
    fn rejects_group_without_choice() {
        let err = ChoiceData::from_rows(
            &[vec![1.0], vec![2.0]],
            vec![false, false],
            vec![0, 0],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn empty_data_is_invalid_input() {
        let err = ChoiceData::new(Array2::zeros((0, 2)), vec![], vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = ChoiceData::from_rows(&[], vec![], vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn rejects_group_with_two_choices() {
        let err = ChoiceData::from_rows(
            &[vec![1.0], vec![2.0], vec![3.0]],
            vec![true, true, false],
            vec![0, 0, 0],
        )
        .unwrap_err();
        assert!(err.to_string().contains("2 chosen"));
    }

    #[test]
    fn rejects_singleton_group() {
        let err = ChoiceData::from_rows(
            &[vec![1.0], vec![2.0], vec![3.0]],
            vec![true, false, true],
            vec![0, 0, 1],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn rejects_misaligned_vectors() {
        let err = ChoiceData::from_rows(&[vec![1.0], vec![2.0]], vec![true], vec![0, 0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn feature_names_must_match_columns() {
        let data = ChoiceData::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]], vec![true, false], vec![0, 0])
            .unwrap();
        assert!(data.clone().with_feature_names(vec!["a"]).is_err());
        let named = data.with_feature_names(vec!["brand", "price"]).unwrap();
        assert_eq!(named.feature_names(), &["brand".to_string(), "price".to_string()]);
    }

    #[test]
    fn one_hot_rejects_bad_arguments() {
        assert!(one_hot(0, 1).is_err());
        assert!(one_hot(3, 3).is_err());
        assert!(decode_one_hot(&[false, false]).is_err());
        assert!(decode_one_hot(&[true, true]).is_err());
    }

    proptest! {
        #[test]
        fn one_hot_round_trip(n in 2usize..64, seed in any::<usize>()) {
            let index = seed % n;
            let encoded = one_hot(index, n).unwrap();
            prop_assert_eq!(encoded.len(), n);
            prop_assert_eq!(decode_one_hot(&encoded).unwrap(), index);
        }
    }
}
