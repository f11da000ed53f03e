//! Declaration model consumed by the metrics engine
//!
//! The model is produced upstream by a source parser and arrives here as plain
//! data, already filtered to exported declarations. It is validated once on
//! load and treated as read-only for the rest of the analysis.

use crate::error::{MetricsError, Result};
use crate::oracle::ContextHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Type used for parameters that carry neither a type nor an initializer
pub const WILDCARD_TYPE: &str = "any";

/// One analyzed codebase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Display name used in every emitted report
    pub name: String,
    /// Root directory of the analyzed sources
    #[serde(default)]
    pub base_path: PathBuf,
    /// Handle from which each worker rebuilds its own type oracle
    #[serde(default)]
    pub context: ContextHandle,
    /// Entry source file the declarations were collected from
    #[serde(default)]
    pub root: String,
    /// Modules keyed by path relative to the project root
    #[serde(default)]
    pub modules: BTreeMap<String, Module>,
}

/// A source file: exported name to its declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Module {
    pub exports: BTreeMap<String, Vec<Declaration>>,
}

/// An exported declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
    Function(Callable),
    Class(ClassDecl),
}

/// Anything with a signature: free functions and class methods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Callable {
    #[serde(default)]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<String>,
    /// Overload signatures; when present the implementation signature is hidden
    #[serde(default)]
    pub overloads: Vec<Signature>,
    #[serde(default)]
    pub docs: Vec<String>,
}

/// A single overload signature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassDecl {
    #[serde(default)]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(flatten)]
    pub callable: Callable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_expr: Option<String>,
    #[serde(default)]
    pub initializer: Option<String>,
}

/// Generic type parameter of a function, method or class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub constraint: Option<String>,
}

/// Borrowed view over a signature, shared by implementations and overloads
#[derive(Debug, Clone, Copy)]
pub struct SignatureRef<'a> {
    pub type_parameters: &'a [TypeParameter],
    pub parameters: &'a [Parameter],
    pub return_type: Option<&'a str>,
    pub docs: &'a [String],
}

/// Identity of a scored construct. Methods point at their owning class
/// through [`ConstructId::owner`] instead of holding a copy of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstructId {
    pub module: String,
    pub name: String,
    pub method: Option<String>,
    /// Position of a method among its class's methods; 0 for functions
    #[serde(default)]
    pub position: usize,
}

/// A function or public method ready to be scored
#[derive(Debug, Clone)]
pub struct Construct<'a> {
    pub id: ConstructId,
    pub callable: &'a Callable,
    /// Type parameters of the owning class (empty for free functions)
    pub class_scope: &'a [TypeParameter],
}

impl Parameter {
    /// Declared type, falling back to the initializer text, then the wildcard
    pub fn effective_type(&self) -> &str {
        self.type_expr
            .as_deref()
            .or(self.initializer.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(WILDCARD_TYPE)
    }
}

impl Signature {
    pub fn view(&self) -> SignatureRef<'_> {
        SignatureRef {
            type_parameters: &self.type_parameters,
            parameters: &self.parameters,
            return_type: self.return_type.as_deref(),
            docs: &self.docs,
        }
    }
}

impl Callable {
    pub fn has_overloads(&self) -> bool {
        !self.overloads.is_empty()
    }

    /// The implementation signature
    pub fn signature(&self) -> SignatureRef<'_> {
        SignatureRef {
            type_parameters: &self.type_parameters,
            parameters: &self.parameters,
            return_type: self.return_type.as_deref(),
            docs: &self.docs,
        }
    }

    /// Signatures callers can see: the overloads if any, otherwise the implementation
    pub fn visible_signatures(&self) -> Vec<SignatureRef<'_>> {
        if self.has_overloads() {
            self.overloads.iter().map(Signature::view).collect()
        } else {
            vec![self.signature()]
        }
    }

    /// Number of times the construct counts as an API entry point
    pub fn entry_weight(&self) -> usize {
        self.overloads.len().max(1)
    }

    fn validate(&self, location: &str) -> Result<()> {
        check_type_parameters(&self.type_parameters, location)?;
        check_parameters(&self.parameters, location)?;
        for (i, overload) in self.overloads.iter().enumerate() {
            let overload_location = format!("{} (overload {})", location, i + 1);
            check_type_parameters(&overload.type_parameters, &overload_location)?;
            check_parameters(&overload.parameters, &overload_location)?;
        }
        Ok(())
    }
}

impl Method {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl ConstructId {
    pub fn function(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            method: None,
            position: 0,
        }
    }

    pub fn method(
        module: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            name: class.into(),
            method: Some(method.into()),
            position: 0,
        }
    }

    /// Same method at another position, so same-named methods stay apart
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Owning class of a method; `None` for free functions and classes
    pub fn owner(&self) -> Option<ConstructId> {
        self.method.as_ref().map(|_| ConstructId {
            module: self.module.clone(),
            name: self.name.clone(),
            method: None,
            position: 0,
        })
    }

    /// Name a caller would type: the method name for methods, else the export name
    pub fn callable_name(&self) -> &str {
        self.method.as_deref().unwrap_or(&self.name)
    }
}

impl Module {
    /// All exported functions and public methods of this module
    pub fn constructs<'a>(&'a self, module_path: &str) -> Vec<Construct<'a>> {
        let mut constructs = Vec::new();
        for (name, declarations) in &self.exports {
            // Merged class declarations number their methods continuously
            let mut offset = 0;
            for declaration in declarations {
                match declaration {
                    Declaration::Function(callable) => constructs.push(Construct {
                        id: ConstructId::function(module_path, name),
                        callable,
                        class_scope: &[],
                    }),
                    Declaration::Class(class) => {
                        for (i, method) in class.methods.iter().enumerate() {
                            if !method.is_public() {
                                continue;
                            }
                            constructs.push(Construct {
                                id: ConstructId::method(module_path, name, &method.name)
                                    .at(offset + i),
                                callable: &method.callable,
                                class_scope: &class.type_parameters,
                            });
                        }
                        offset += class.methods.len();
                    }
                }
            }
        }
        constructs
    }

    fn validate(&self, module_path: &str) -> Result<()> {
        for (name, declarations) in &self.exports {
            if name.trim().is_empty() {
                return Err(MetricsError::input(format!(
                    "module '{}' exports an unnamed declaration",
                    module_path
                )));
            }
            if declarations.is_empty() {
                return Err(MetricsError::input(format!(
                    "export '{}' in module '{}' has no declarations",
                    name, module_path
                )));
            }
            let functions = declarations
                .iter()
                .filter(|d| matches!(d, Declaration::Function(_)))
                .count();
            if functions > 0 && functions < declarations.len() {
                return Err(MetricsError::input(format!(
                    "export '{}' in module '{}' mixes function and class declarations",
                    name, module_path
                )));
            }
            let location = format!("{}::{}", module_path, name);
            for declaration in declarations {
                match declaration {
                    Declaration::Function(callable) => callable.validate(&location)?,
                    Declaration::Class(class) => {
                        check_type_parameters(&class.type_parameters, &location)?;
                        for method in &class.methods {
                            if method.name.trim().is_empty() {
                                return Err(MetricsError::input(format!(
                                    "class '{}' declares an unnamed method",
                                    location
                                )));
                            }
                            method
                                .callable
                                .validate(&format!("{}.{}", location, method.name))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Project {
    /// Load a declaration model from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&content)
            .map_err(|e| MetricsError::input(format!("{}: {}", path.display(), e)))?;
        project.validate()?;
        debug!(
            "Loaded project '{}' with {} modules from {}",
            project.name,
            project.modules.len(),
            path.display()
        );
        Ok(project)
    }

    /// Check the model invariants before any metric runs
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MetricsError::input("project name is empty"));
        }
        for (path, module) in &self.modules {
            if path.trim().is_empty() {
                return Err(MetricsError::input(format!(
                    "project '{}' has a module with an empty path",
                    self.name
                )));
            }
            module.validate(path)?;
        }
        Ok(())
    }

    /// Every exported function and public method across all modules
    pub fn constructs(&self) -> impl Iterator<Item = Construct<'_>> {
        self.modules
            .iter()
            .flat_map(|(path, module)| module.constructs(path))
    }
}

fn check_parameters(parameters: &[Parameter], location: &str) -> Result<()> {
    if let Some(i) = parameters.iter().position(|p| p.name.trim().is_empty()) {
        return Err(MetricsError::input(format!(
            "{}: parameter {} has no name",
            location,
            i + 1
        )));
    }
    Ok(())
}

fn check_type_parameters(type_parameters: &[TypeParameter], location: &str) -> Result<()> {
    if type_parameters.iter().any(|tp| tp.name.trim().is_empty()) {
        return Err(MetricsError::input(format!(
            "{}: type parameter without a name",
            location
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "sample",
        "context": "",
        "modules": {
            "src/users.ts": {
                "getUser": [{
                    "kind": "function",
                    "parameters": [{ "name": "id", "type": "number" }],
                    "return_type": "User"
                }],
                "UserStore": [{
                    "kind": "class",
                    "type_parameters": [{ "name": "T" }],
                    "methods": [
                        { "name": "find", "parameters": [{ "name": "key", "type": "T" }] },
                        { "name": "evict", "visibility": "private" }
                    ]
                }]
            }
        }
    }"#;

    #[test]
    fn test_deserialize_and_walk_constructs() {
        let project: Project = serde_json::from_str(SAMPLE).unwrap();
        project.validate().unwrap();

        let constructs: Vec<_> = project.constructs().collect();
        assert_eq!(constructs.len(), 2, "private method must not participate");

        let method = constructs
            .iter()
            .find(|c| c.id.method.is_some())
            .unwrap();
        assert_eq!(method.id.callable_name(), "find");
        assert_eq!(method.class_scope.len(), 1);
        assert_eq!(
            method.id.owner(),
            Some(ConstructId::function("src/users.ts", "UserStore"))
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let raw = r#"{ "name": "p", "modules": { "a.ts": { "x": [{ "kind": "enum" }] } } }"#;
        assert!(serde_json::from_str::<Project>(raw).is_err());
    }

    #[test]
    fn test_validate_rejects_unnamed_parameter() {
        let raw = r#"{ "name": "p", "modules": { "a.ts": {
            "f": [{ "kind": "function", "parameters": [{ "name": "" }] }]
        } } }"#;
        let project: Project = serde_json::from_str(raw).unwrap();
        let err = project.validate().unwrap_err();
        assert!(matches!(err, MetricsError::InputShape(_)));
    }

    #[test]
    fn test_validate_rejects_empty_declaration_list() {
        let raw = r#"{ "name": "p", "modules": { "a.ts": { "f": [] } } }"#;
        let project: Project = serde_json::from_str(raw).unwrap();
        assert!(project.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_function_and_class_under_one_name() {
        let raw = r#"{ "name": "p", "modules": { "a.ts": { "Point": [
            { "kind": "function" },
            { "kind": "class", "methods": [{ "name": "norm" }] }
        ] } } }"#;
        let project: Project = serde_json::from_str(raw).unwrap();
        assert!(matches!(project.validate(), Err(MetricsError::InputShape(_))));
    }

    #[test]
    fn test_same_named_methods_get_distinct_positions() {
        let raw = r#"{ "name": "p", "modules": { "a.ts": { "Cache": [
            { "kind": "class", "methods": [
                { "name": "create" },
                { "name": "hidden", "visibility": "private" },
                { "name": "create", "parameters": [{ "name": "size", "type": "number" }] }
            ] },
            { "kind": "class", "methods": [{ "name": "clear" }] }
        ] } } }"#;
        let project: Project = serde_json::from_str(raw).unwrap();
        project.validate().unwrap();

        let positions: Vec<_> = project
            .constructs()
            .map(|c| (c.id.callable_name().to_string(), c.id.position))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("create".to_string(), 0),
                ("create".to_string(), 2),
                ("clear".to_string(), 3)
            ]
        );
    }

    #[test]
    fn test_effective_type_fallbacks() {
        let typed = Parameter {
            name: "a".into(),
            type_expr: Some("string".into()),
            initializer: Some("1".into()),
        };
        let initialized = Parameter {
            name: "b".into(),
            type_expr: None,
            initializer: Some("1".into()),
        };
        let bare = Parameter {
            name: "c".into(),
            ..Default::default()
        };
        assert_eq!(typed.effective_type(), "string");
        assert_eq!(initialized.effective_type(), "1");
        assert_eq!(bare.effective_type(), WILDCARD_TYPE);
    }

    #[test]
    fn test_visible_signatures_hide_implementation() {
        let callable = Callable {
            parameters: vec![Parameter {
                name: "impl".into(),
                ..Default::default()
            }],
            overloads: vec![Signature::default(), Signature::default()],
            ..Default::default()
        };
        assert_eq!(callable.visible_signatures().len(), 2);
        assert_eq!(callable.entry_weight(), 2);
        assert_eq!(Callable::default().visible_signatures().len(), 1);
    }
}
