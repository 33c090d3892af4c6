//! Textual output: type references and declaration skeletons.
//!
//! Output is deterministic for a given graph. References that cannot be resolved are logged and
//! printed as [`UNDEFINED_MARKER`] so one bad reference does not abort a whole write.

use std::fmt::{self, Write as _};

use crate::generic::TypeKind;
use crate::members::OperationKind;
use crate::model::CodeModel;
use crate::names::{is_standard_package_member, UNDEFINED_MARKER, WILDCARD_NAME};
use crate::type_vars::TypeVarOwner;
use crate::{OperationId, TypeCategory, TypeId};

const INDENT: &str = "    ";
const MAX_WRITE_DEPTH: usize = 64;

impl CodeModel {
    /// Write the reference form of `id`.
    ///
    /// With `declaration`, raw types print their type parameters and type variables print
    /// their bounds (`Box<T extends Number>`). With `qualified`, raw types print their
    /// qualified name; proxies marked qualified force it for their delegate.
    pub fn write_reference(
        &mut self,
        id: TypeId,
        out: &mut dyn fmt::Write,
        declaration: bool,
        qualified: bool,
    ) -> fmt::Result {
        self.write_reference_at(id, out, declaration, qualified, 0)
    }

    pub fn reference_string(&mut self, id: TypeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_reference(id, &mut out, false, false);
        out
    }

    pub fn qualified_reference_string(&mut self, id: TypeId) -> String {
        let mut out = String::new();
        let _ = self.write_reference(id, &mut out, false, true);
        out
    }

    fn write_reference_at(
        &mut self,
        id: TypeId,
        out: &mut dyn fmt::Write,
        declaration: bool,
        qualified: bool,
        depth: usize,
    ) -> fmt::Result {
        if depth > MAX_WRITE_DEPTH {
            return out.write_str("...");
        }
        self.write_meta(id, out)?;
        let depth = depth + 1;

        match self.kind(id) {
            TypeKind::Raw(_) => {
                let name = self.display_name(id, qualified);
                out.write_str(&name)?;
                if declaration {
                    self.write_type_params(TypeVarOwner::Type(id), out, qualified, depth)?;
                }
                Ok(())
            }
            TypeKind::Array(array) => {
                let component = array.component;
                self.write_reference_at(component, out, false, qualified, depth)?;
                out.write_str("[]")
            }
            TypeKind::Parameterized(p) => {
                let (base, args) = (p.base, p.args.clone());
                self.write_reference_at(base, out, false, qualified, depth)?;
                out.write_char('<')?;
                self.write_list(&args, ", ", out, qualified, depth)?;
                out.write_char('>')
            }
            TypeKind::Variable(var) => {
                out.write_str(&var.name.clone())?;
                if declaration {
                    if let Some(bound) = self.printable_bound(id) {
                        out.write_str(" extends ")?;
                        self.write_reference_at(bound, out, false, qualified, depth)?;
                    }
                }
                Ok(())
            }
            TypeKind::Wildcard(wildcard) => {
                let is_super = wildcard.is_super;
                out.write_str(WILDCARD_NAME)?;
                if id == self.unbounded_wildcard {
                    return Ok(());
                }
                let bound = if is_super {
                    self.bound(id)
                } else {
                    self.printable_bound(id)
                };
                if let Some(bound) = bound {
                    out.write_str(if is_super { " super " } else { " extends " })?;
                    self.write_reference_at(bound, out, false, qualified, depth)?;
                }
                Ok(())
            }
            TypeKind::Composed(c) => {
                let parts = c.parts.clone();
                self.write_list(&parts, " & ", out, qualified, depth)
            }
            TypeKind::Proxy(proxy) => {
                let (delegate, forced) = (proxy.delegate, proxy.qualified);
                self.write_reference_at(delegate, out, declaration, qualified || forced, depth)
            }
            TypeKind::Source(source) => {
                let raw_name = source.raw_name.clone();
                match self.delegate(id) {
                    Some(delegate) => {
                        self.write_reference_at(delegate, out, declaration, qualified, depth)
                    }
                    None => {
                        tracing::warn!(
                            target: "jmodel.types",
                            name = %raw_name,
                            "writing unresolved type reference"
                        );
                        out.write_str(UNDEFINED_MARKER)
                    }
                }
            }
        }
    }

    fn write_meta(&self, id: TypeId, out: &mut dyn fmt::Write) -> fmt::Result {
        let meta = &self.node(id).meta;
        if let Some(comment) = &meta.comment {
            write!(out, "/* {comment} */ ")?;
        }
        for annotation in &meta.annotations {
            write!(out, "@{}", annotation.name)?;
            if let Some(arguments) = &annotation.arguments {
                write!(out, "({arguments})")?;
            }
            out.write_char(' ')?;
        }
        Ok(())
    }

    fn write_list(
        &mut self,
        items: &[TypeId],
        separator: &str,
        out: &mut dyn fmt::Write,
        qualified: bool,
        depth: usize,
    ) -> fmt::Result {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                out.write_str(separator)?;
            }
            self.write_reference_at(*item, out, false, qualified, depth)?;
        }
        Ok(())
    }

    fn write_type_params(
        &mut self,
        owner: TypeVarOwner,
        out: &mut dyn fmt::Write,
        qualified: bool,
        depth: usize,
    ) -> fmt::Result {
        let vars = self.type_variables(owner);
        if vars.is_empty() {
            return Ok(());
        }
        out.write_char('<')?;
        for (index, var) in vars.iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            self.write_reference_at(*var, out, true, qualified, depth)?;
        }
        out.write_char('>')
    }

    /// The bound worth printing: anything but the root type.
    fn printable_bound(&mut self, id: TypeId) -> Option<TypeId> {
        let bound = self.bound(id)?;
        let unwrapped = self.unwrap_proxies(bound);
        (unwrapped != self.root).then_some(bound)
    }

    /// Qualified name, or the simple name prefixed by enclosing types (`Map.Entry`).
    fn display_name(&self, id: TypeId, qualified: bool) -> String {
        let Some(raw) = self.raw(id) else {
            return self.describe(id.into());
        };
        let omit = self.options.omit_standard_packages
            && is_standard_package_member(&raw.qualified_name);
        if qualified && !omit {
            return raw.qualified_name.to_string();
        }
        let mut segments = vec![raw.name.to_string()];
        let mut outer = raw.declaring_type;
        while let Some(ty) = outer {
            match self.raw(ty) {
                Some(raw) if segments.len() <= MAX_WRITE_DEPTH => {
                    segments.push(raw.name.to_string());
                    outer = raw.declaring_type;
                }
                _ => break,
            }
        }
        segments.reverse();
        segments.join(".")
    }

    /// Write a declaration skeleton of raw type `ty`: header, fields, operation signatures and
    /// nested types. Bodies are not part of the model and print as `;`.
    pub fn write_declaration(&mut self, ty: TypeId, out: &mut dyn fmt::Write) -> fmt::Result {
        self.write_declaration_at(ty, out, 0)
    }

    pub fn declaration_string(&mut self, ty: TypeId) -> String {
        let mut out = String::new();
        let _ = self.write_declaration(ty, &mut out);
        out
    }

    fn write_declaration_at(
        &mut self,
        ty: TypeId,
        out: &mut dyn fmt::Write,
        level: usize,
    ) -> fmt::Result {
        self.ensure_initialized(ty.into());
        let Some(raw) = self.raw(ty) else {
            return self.write_reference(ty, out, true, false);
        };
        let indent = INDENT.repeat(level);
        let (modifiers, category, name) = (raw.modifiers, raw.category, raw.name.clone());

        out.write_str(&indent)?;
        for keyword in modifiers.keywords() {
            write!(out, "{keyword} ")?;
        }
        write!(out, "{} {name}", category.keyword())?;
        self.write_type_params(TypeVarOwner::Type(ty), out, false, 0)?;

        let (extends, implements) = self.header_super_types(ty, category);
        if !extends.is_empty() {
            out.write_str(" extends ")?;
            self.write_list(&extends, ", ", out, false, 0)?;
        }
        if !implements.is_empty() {
            out.write_str(" implements ")?;
            self.write_list(&implements, ", ", out, false, 0)?;
        }
        out.write_str(" {\n")?;

        let member_indent = INDENT.repeat(level + 1);
        let mut section_written = false;

        let fields = self.fields(ty);
        for field in &fields {
            let def = self.field(*field).clone();
            out.write_str(&member_indent)?;
            for keyword in def.modifiers.keywords() {
                write!(out, "{keyword} ")?;
            }
            self.write_reference(def.ty, out, false, false)?;
            write!(out, " {}", def.name)?;
            if let Some(initializer) = &def.initializer {
                write!(out, " = {initializer}")?;
            }
            out.write_str(";\n")?;
        }
        section_written |= !fields.is_empty();

        let operations: Vec<OperationId> = self
            .constructors(ty)
            .into_iter()
            .chain(self.methods(ty))
            .collect();
        if section_written && !operations.is_empty() {
            out.write_char('\n')?;
        }
        for op in &operations {
            out.write_str(&member_indent)?;
            self.write_signature(*op, out)?;
            out.write_str(";\n")?;
        }
        section_written |= !operations.is_empty();

        for nested in self.nested_types(ty) {
            if section_written {
                out.write_char('\n')?;
            }
            self.write_declaration_at(nested, out, level + 1)?;
            section_written = true;
        }

        writeln!(out, "{indent}}}")
    }

    /// `extends` and `implements` lists for a declaration header. Implicit super-types (the
    /// root type, an enum's or record's base class) are left out.
    fn header_super_types(&mut self, ty: TypeId, category: TypeCategory) -> (Vec<TypeId>, Vec<TypeId>) {
        let declared = self.declared_super_types(ty);
        if category.is_interface() {
            return (declared, Vec::new());
        }
        let mut extends = Vec::new();
        let mut implements = Vec::new();
        for sup in declared {
            if self.category(sup).is_interface() {
                implements.push(sup);
            } else if category == TypeCategory::Class && self.as_type(sup) != self.root {
                extends.push(sup);
            }
        }
        (extends, implements)
    }

    /// `modifiers <T> Return name(Type a, Type... b) throws X`
    pub fn write_signature(&mut self, op: OperationId, out: &mut dyn fmt::Write) -> fmt::Result {
        let def = self.operation(op).clone();
        for keyword in def.modifiers.keywords() {
            write!(out, "{keyword} ")?;
        }
        if !self.type_variables(TypeVarOwner::Operation(op)).is_empty() {
            self.write_type_params(TypeVarOwner::Operation(op), out, false, 0)?;
            out.write_char(' ')?;
        }
        if def.kind == OperationKind::Method {
            match def.return_type {
                Some(ret) => self.write_reference(ret, out, false, false)?,
                None => out.write_str("void")?,
            }
            out.write_char(' ')?;
        }
        write!(out, "{}(", def.name)?;
        for (index, param) in def.params.iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            match self.component_type(param.ty).filter(|_| param.varargs) {
                Some(component) => {
                    self.write_reference(component, out, false, false)?;
                    out.write_str("...")?;
                }
                None => {
                    self.write_reference(param.ty, out, false, false)?;
                    if param.varargs {
                        out.write_str("...")?;
                    }
                }
            }
            write!(out, " {}", param.name)?;
        }
        out.write_char(')')?;
        if !def.throws.is_empty() {
            out.write_str(" throws ")?;
            self.write_list(&def.throws, ", ", out, false, 0)?;
        }
        Ok(())
    }
}
