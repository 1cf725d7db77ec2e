//! Generated function declarations and their rendering.

use std::collections::BTreeMap;

use snafu::{Snafu, ensure};

use crate::{naming, render};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("malformed declaration {name:?}: {reason}"))]
    MalformedDeclaration { name: String, reason: &'static str },
}

/// One synthesized function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub arguments: String,
    pub outputs: String,
    pub body: String,

    /// The qualified name of the type the function was generated for.
    pub owner: String,
}

impl FunctionDeclaration {
    /// Checks the declaration can be rendered into a well-formed function.
    pub fn validate(&self) -> Result<()> {
        let name = &self.name;
        ensure!(
            naming::is_identifier(name),
            MalformedDeclarationSnafu {
                name,
                reason: "the name is not an identifier"
            }
        );
        ensure!(
            !self.arguments.trim().is_empty(),
            MalformedDeclarationSnafu {
                name,
                reason: "the argument list is empty"
            }
        );
        ensure!(
            !self.outputs.trim().is_empty(),
            MalformedDeclarationSnafu {
                name,
                reason: "the return type is empty"
            }
        );
        ensure!(
            !self.body.trim().is_empty(),
            MalformedDeclarationSnafu {
                name,
                reason: "the body is empty"
            }
        );
        Ok(())
    }

    pub fn render(&self) -> Result<String> {
        self.validate()?;
        Ok(render::function(&self.name, &self.arguments, &self.outputs, &self.body))
    }
}

/// Every declaration of one generation call, keyed by function name.
#[derive(Clone, Debug, Default)]
pub struct DeclarationSet {
    declarations: BTreeMap<String, FunctionDeclaration>,
}

impl DeclarationSet {
    /// Registers a declaration. A declaration with the same name is replaced
    /// and returned.
    pub fn insert(&mut self, declaration: FunctionDeclaration) -> Option<FunctionDeclaration> {
        tracing::debug!(
            function = declaration.name,
            owner = declaration.owner,
            "registering declaration"
        );
        self.declarations.insert(declaration.name.clone(), declaration)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDeclaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Iterates in function name order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.declarations.values()
    }

    /// Renders every declaration, keyed and sorted by function name. A single
    /// malformed declaration fails the whole call.
    pub fn render(&self) -> Result<BTreeMap<String, String>> {
        self.declarations
            .iter()
            .map(|(name, declaration)| Ok((name.clone(), declaration.render()?)))
            .collect()
    }
}

/// Joins rendered functions in name order, separated by a blank line.
pub fn render_source(rendered: &BTreeMap<String, String>) -> String {
    rendered.values().map(String::as_str).collect::<Vec<_>>().join("\n\n")
}
