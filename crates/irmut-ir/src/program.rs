//! Programs: function definitions plus external declarations.

use crate::function::Function;
use crate::types::Type;
use irmut_core::Result;
use serde::{Deserialize, Serialize};

/// Signature of a function without a body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub ret_ty: Type,
    pub params: Vec<Type>,
}

impl Declaration {
    /// Signature of a defined function
    pub fn of(func: &Function) -> Self {
        Self {
            name: func.name.clone(),
            ret_ty: func.ret_ty.clone(),
            params: func
                .params()
                .iter()
                .map(|param| func.value_type(param.value).clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(functions: Vec<Function>) -> Self {
        Self {
            functions,
            declarations: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Count total instructions in the program
    pub fn total_instructions(&self) -> usize {
        self.functions.iter().map(|f| f.instruction_count()).sum()
    }

    pub fn defines(&self, name: &str) -> bool {
        self.get_function(name).is_some()
    }

    /// Returns true if `name` is a definition or a declaration
    pub fn has_symbol(&self, name: &str) -> bool {
        self.defines(name) || self.get_declaration(name).is_some()
    }

    /// Adds `decl` unless the name is already taken
    pub fn declare(&mut self, decl: Declaration) -> bool {
        if self.has_symbol(&decl.name) {
            return false;
        }
        self.declarations.push(decl);
        true
    }

    /// Renames a definition or declaration and every call site that names it
    pub fn rename_function(&mut self, from: &str, to: &str) {
        for func in &mut self.functions {
            if func.name == from {
                func.name = to.to_string();
            }
            func.rename_callee(from, to);
        }
        for decl in &mut self.declarations {
            if decl.name == from {
                decl.name = to.to_string();
            }
        }
    }

    /// Removes the named definitions. Those still called by a remaining function
    /// become declarations so no call dangles.
    pub fn discard_functions(&mut self, names: &[String]) -> usize {
        let (discarded, kept): (Vec<Function>, Vec<Function>) = std::mem::take(&mut self.functions)
            .into_iter()
            .partition(|f| names.contains(&f.name));
        self.functions = kept;

        for func in &discarded {
            if self.functions.iter().any(|f| f.calls(&func.name)) {
                self.declare(Declaration::of(func));
            }
        }
        discarded.len()
    }

    /// Declares every called function that has neither a body nor a declaration,
    /// deriving the signature from the call site
    pub fn declare_missing_callees(&mut self) -> Vec<String> {
        let mut missing: Vec<Declaration> = Vec::new();
        for func in &self.functions {
            for (inst, name) in func.callees() {
                if self.has_symbol(name) || missing.iter().any(|d| d.name == name) {
                    continue;
                }
                missing.push(Declaration {
                    name: name.to_string(),
                    ret_ty: func.result_type(inst),
                    params: func[inst]
                        .args()
                        .iter()
                        .map(|arg| func.value_type(*arg).clone())
                        .collect(),
                });
            }
        }

        let names = missing.iter().map(|d| d.name.clone()).collect();
        self.declarations.extend(missing);
        names
    }

    /// Serialize the program to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a program from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
