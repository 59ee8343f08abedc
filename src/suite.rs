//! Suite description loading.
//!
//! A suite file is a JSON object mapping category name to an array of test
//! records. Category order in the file is the order the suite runs in, so
//! the file is decoded through `serde_json`'s order-preserving map. Test
//! names must be unique across the whole suite.

use crate::error::{HarnessError, HarnessResult};
use crate::state::StackState;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Wire format of one test record.
#[derive(Debug, Deserialize)]
struct TestCaseRecord {
    name: String,
    program: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    expected: Option<ExpectedStacks>,
}

/// Wire format of a hand-authored expected state; absent stacks mean empty.
#[derive(Debug, Deserialize)]
struct ExpectedStacks {
    #[serde(default)]
    integer: Vec<i64>,
    #[serde(default)]
    float: Vec<f64>,
    #[serde(default)]
    boolean: Vec<bool>,
}

impl ExpectedStacks {
    fn into_state(self) -> StackState {
        StackState {
            integers: self.integer,
            floats: self.float,
            booleans: self.boolean,
        }
    }
}

/// One test case. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Unique name within the suite.
    pub name: String,
    /// Category this test belongs to.
    pub category: String,
    /// Program in the candidate's dialect.
    pub program: String,
    /// Optional human description.
    pub description: Option<String>,
    /// Optional hand-authored expected final state.
    pub expected: Option<StackState>,
}

/// One category of tests, in suite order.
#[derive(Debug, Clone)]
pub struct SuiteCategory {
    /// Category name (the suite file's map key).
    pub name: String,
    /// Tests in file order.
    pub tests: Vec<TestCase>,
}

/// A loaded test suite: categories in file order.
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Categories in file order.
    pub categories: Vec<SuiteCategory>,
}

impl TestSuite {
    /// Load a suite from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> HarnessResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| HarnessError::SuiteLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            HarnessError::SuiteLoad { reason, .. } => HarnessError::SuiteLoad {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Decode a suite from JSON text.
    pub fn from_json(text: &str) -> HarnessResult<Self> {
        let load_err = |reason: String| HarnessError::SuiteLoad {
            path: String::new(),
            reason,
        };

        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| load_err(e.to_string()))?;

        let mut seen = BTreeSet::new();
        let mut categories = Vec::with_capacity(raw.len());
        for (category, value) in raw {
            let records: Vec<TestCaseRecord> = serde_json::from_value(value)
                .map_err(|e| load_err(format!("category `{category}`: {e}")))?;
            let mut tests = Vec::with_capacity(records.len());
            for record in records {
                if !seen.insert(record.name.clone()) {
                    return Err(load_err(format!("duplicate test name `{}`", record.name)));
                }
                tests.push(TestCase {
                    name: record.name,
                    category: category.clone(),
                    program: record.program,
                    description: record.description,
                    expected: record.expected.map(ExpectedStacks::into_state),
                });
            }
            categories.push(SuiteCategory {
                name: category,
                tests,
            });
        }
        Ok(Self { categories })
    }

    /// Total number of tests across all categories.
    pub fn test_count(&self) -> usize {
        self.categories.iter().map(|c| c.tests.len()).sum()
    }

    /// All tests in suite order (category order, then file order within).
    pub fn tests(&self) -> impl Iterator<Item = &TestCase> {
        self.categories.iter().flat_map(|c| c.tests.iter())
    }

    /// Find one test by name.
    pub fn find(&self, name: &str) -> Option<&TestCase> {
        self.tests().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"{
        "edge_cases": [
            {"name": "div_by_zero", "program": "5 0 INTEGER./"},
            {"name": "add_basic", "program": "3 4 INTEGER.+",
             "description": "push 3, push 4, add",
             "expected": {"integer": [7]}}
        ],
        "boolean_ops": [
            {"name": "not_true", "program": "TRUE BOOLEAN.NOT",
             "expected": {"boolean": [false]}}
        ]
    }"#;

    #[test]
    fn test_load_preserves_category_order() {
        let suite = TestSuite::from_json(SUITE).unwrap();
        let names: Vec<&str> = suite.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["edge_cases", "boolean_ops"]);
        assert_eq!(suite.test_count(), 3);
    }

    #[test]
    fn test_expected_stacks() {
        let suite = TestSuite::from_json(SUITE).unwrap();
        let test = suite.find("add_basic").unwrap();
        let expected = test.expected.as_ref().unwrap();
        assert_eq!(expected.integers, vec![7]);
        assert!(expected.floats.is_empty());
        assert!(expected.booleans.is_empty());

        let test = suite.find("div_by_zero").unwrap();
        assert!(test.expected.is_none());
        assert_eq!(test.category, "edge_cases");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let text = r#"{
            "a": [{"name": "t1", "program": "1"}],
            "b": [{"name": "t1", "program": "2"}]
        }"#;
        let err = TestSuite::from_json(text).unwrap_err();
        assert!(err.to_string().contains("duplicate test name `t1`"));
    }

    #[test]
    fn test_missing_required_field() {
        let text = r#"{"a": [{"name": "t1"}]}"#;
        let err = TestSuite::from_json(text).unwrap_err();
        assert!(err.to_string().contains("program"));
    }

    #[test]
    fn test_find_unknown_name() {
        let suite = TestSuite::from_json(SUITE).unwrap();
        assert!(suite.find("nope").is_none());
    }
}
