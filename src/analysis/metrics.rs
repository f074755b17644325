//! Code metrics derived from a structural description

use serde::{Deserialize, Serialize};

use crate::parsing::StructuralDescription;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InheritanceMetrics {
    /// Classes that extend another class
    pub depth_of_inheritance: usize,
    /// Interfaces implemented across all classes
    pub number_of_children: usize,
    pub class_hierarchies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub cyclomatic_complexity: u32,
    pub cohesion: f64,
    pub coupling: usize,
    pub inheritance: InheritanceMetrics,
    pub maintainability_index: f64,
    pub technical_debt: f64,
}

impl CodeMetrics {
    /// Compute every metric for one file. `lines_of_code` is the file's line count.
    pub fn compute(desc: &StructuralDescription, lines_of_code: usize) -> Self {
        let cyclomatic_complexity = cyclomatic_complexity(desc);
        Self {
            cyclomatic_complexity,
            cohesion: cohesion(desc),
            coupling: desc.imports.len(),
            inheritance: inheritance(desc),
            maintainability_index: maintainability_index(cyclomatic_complexity, lines_of_code),
            technical_debt: technical_debt(desc, cyclomatic_complexity),
        }
    }
}

fn cyclomatic_complexity(desc: &StructuralDescription) -> u32 {
    let functions: u32 = desc.functions.iter().map(|f| f.complexity.max(1)).sum();
    let methods = desc.methods().count() as u32;
    1 + functions + methods
}

/// Mean property-to-method ratio; classes without methods count as 0
fn cohesion(desc: &StructuralDescription) -> f64 {
    if desc.classes.is_empty() {
        return 0.0;
    }
    let total: f64 = desc
        .classes
        .iter()
        .map(|c| {
            if c.methods.is_empty() {
                0.0
            } else {
                c.properties.len() as f64 / c.methods.len() as f64
            }
        })
        .sum();
    total / desc.classes.len() as f64
}

fn inheritance(desc: &StructuralDescription) -> InheritanceMetrics {
    InheritanceMetrics {
        depth_of_inheritance: desc
            .classes
            .iter()
            .filter(|c| c.superclass.is_some())
            .count(),
        number_of_children: desc.classes.iter().map(|c| c.interfaces.len()).sum(),
        class_hierarchies: desc.classes.len(),
    }
}

fn maintainability_index(complexity: u32, lines_of_code: usize) -> f64 {
    let cc = f64::from(complexity.max(1));
    let raw = 171.0 - 5.2 * cc.ln() - 0.23 * lines_of_code as f64;
    (raw * 100.0 / 171.0).max(0.0)
}

fn technical_debt(desc: &StructuralDescription, complexity: u32) -> f64 {
    let mut debt = 0.0;

    if complexity > 10 {
        debt += f64::from(complexity) * 0.5;
    }
    if desc
        .error_handling
        .as_ref()
        .is_some_and(|stats| !stats.has_error_handling)
    {
        debt += 5.0;
    }
    debt += desc
        .functions
        .iter()
        .filter(|f| f.complexity > 8)
        .map(|f| f64::from(f.complexity) * 0.3)
        .sum::<f64>();

    (debt * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{
        ClassInfo, ErrorHandlingStats, FunctionInfo, Language, MethodInfo, PropertyInfo,
        Visibility,
    };
    use approx::assert_relative_eq;

    fn function(name: &str, complexity: u32) -> FunctionInfo {
        let mut f = FunctionInfo::named(name, 1);
        f.complexity = complexity;
        f
    }

    fn method(name: &str) -> MethodInfo {
        MethodInfo {
            name: name.to_string(),
            line: 1,
            visibility: Visibility::Public,
            is_static: false,
            is_async: false,
            parameters: Vec::new(),
            return_type: None,
            complexity: 1,
            decorators: Vec::new(),
        }
    }

    fn property(name: &str) -> PropertyInfo {
        PropertyInfo {
            name: name.to_string(),
            line: 1,
            visibility: Visibility::Public,
            is_static: false,
            type_name: None,
            default_value: None,
            optional: false,
        }
    }

    #[test]
    fn test_empty_file() {
        let desc = StructuralDescription::new(Language::JavaScript);
        let metrics = CodeMetrics::compute(&desc, 0);

        assert_eq!(metrics.cyclomatic_complexity, 1);
        assert_eq!(metrics.cohesion, 0.0);
        assert_eq!(metrics.coupling, 0);
        assert_relative_eq!(metrics.maintainability_index, 100.0);
        assert_eq!(metrics.technical_debt, 0.0);
    }

    #[test]
    fn test_complexity_and_cohesion() {
        let mut desc = StructuralDescription::new(Language::TypeScript);
        desc.functions = vec![function("a", 3), function("b", 2)];

        let mut service = ClassInfo::new("Service", 1);
        service.superclass = Some("Base".to_string());
        service.interfaces = vec!["A".to_string(), "B".to_string()];
        service.methods = vec![method("run"), method("stop")];
        service.properties = vec![property("x")];
        desc.classes = vec![service, ClassInfo::new("Empty", 20)];

        let metrics = CodeMetrics::compute(&desc, 40);
        assert_eq!(metrics.cyclomatic_complexity, 1 + 5 + 2);
        assert_relative_eq!(metrics.cohesion, 0.25);
        assert_eq!(
            metrics.inheritance,
            InheritanceMetrics {
                depth_of_inheritance: 1,
                number_of_children: 2,
                class_hierarchies: 2,
            }
        );

        let expected = (171.0 - 5.2 * 8f64.ln() - 0.23 * 40.0) * 100.0 / 171.0;
        assert_relative_eq!(metrics.maintainability_index, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_maintainability_floor() {
        let desc = StructuralDescription::new(Language::C);
        let metrics = CodeMetrics::compute(&desc, 10_000);
        assert_eq!(metrics.maintainability_index, 0.0);
    }

    #[test]
    fn test_technical_debt() {
        let mut desc = StructuralDescription::new(Language::JavaScript);
        desc.functions = vec![function("parse", 9), function("small", 2)];
        desc.error_handling = Some(ErrorHandlingStats::default());

        // cc = 1 + 9 + 2 = 12 -> 6.0, no handling -> 5.0, parse -> 2.7
        let metrics = CodeMetrics::compute(&desc, 10);
        assert_eq!(metrics.cyclomatic_complexity, 12);
        assert_relative_eq!(metrics.technical_debt, 13.7);
    }
}
