//! Partition normalized records by company.

use std::collections::HashMap;

use crate::domain::ObservationRecord;

/// All observations for one company, in input (date-ascending) order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyGroup {
    pub company: String,
    pub records: Vec<ObservationRecord>,
}

impl CompanyGroup {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn profits(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.profit).collect()
    }
}

/// Company → group mapping that iterates in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyGroups {
    groups: Vec<CompanyGroup>,
    index: HashMap<String, usize>,
}

impl CompanyGroups {
    pub fn get(&self, company: &str) -> Option<&CompanyGroup> {
        self.index.get(company).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompanyGroup> {
        self.groups.iter()
    }

    pub fn as_slice(&self) -> &[CompanyGroup] {
        &self.groups
    }

    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.company.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a CompanyGroups {
    type Item = &'a CompanyGroup;
    type IntoIter = std::slice::Iter<'a, CompanyGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Group records by company in a single pass.
///
/// Relative order inside each group is the input order, so a date-sorted
/// input yields date-sorted groups.
pub fn group_by_company(records: &[ObservationRecord]) -> CompanyGroups {
    let mut out = CompanyGroups::default();
    for record in records {
        let idx = match out.index.get(&record.company) {
            Some(&idx) => idx,
            None => {
                let idx = out.groups.len();
                out.groups.push(CompanyGroup {
                    company: record.company.clone(),
                    records: Vec::new(),
                });
                out.index.insert(record.company.clone(), idx);
                idx
            }
        };
        out.groups[idx].records.push(record.clone());
    }
    out
}
