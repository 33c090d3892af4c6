//! The context: node arenas, the type cache, compilation units and name resolution.

use std::collections::HashMap;
use std::fmt;

use crate::generic::{TypeKind, TypeNode, TypeWildcard};
use crate::lifecycle::LazyInit;
use crate::members::{FieldDef, OperationDef, OperationKind};
use crate::mirror::TypeLoader;
use crate::names::{is_primitive, join_qualified, simple_name_of, Name, JAVA_LANG};
use crate::type_vars::{TypeVarContainer, TypeVarOwner};
use crate::{Lifecycle, NodeKey, TypeId, UnitId};

/// Knobs for name resolution and printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOptions {
    /// Unknown names become placeholder raw types instead of resolution misses.
    pub allow_create_missing: bool,
    /// Print `java.lang` types unqualified even when qualified output is requested.
    pub omit_standard_packages: bool,
    pub root_type: String,
    pub root_exception_type: String,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            allow_create_missing: true,
            omit_standard_packages: true,
            root_type: "java.lang.Object".to_string(),
            root_exception_type: "java.lang.Throwable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported name; for on-demand imports, the package or type whose members are imported.
    pub name: Name,
    pub on_demand: bool,
    pub is_static: bool,
}

/// One source file: its package, imports and top-level types.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub(crate) package: Option<Name>,
    pub(crate) imports: Vec<Import>,
    pub(crate) types: Vec<TypeId>,
    pub(crate) finished: bool,
}

impl CompilationUnit {
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Owns every node of a code model.
///
/// Single-threaded: reads take `&mut self` because they may resolve source references or run
/// lazy fills. A model whose units are all finished is not mutated by reads of resolved nodes,
/// but nothing enforces that across threads.
pub struct CodeModel {
    pub(crate) types: Vec<TypeNode>,
    pub(crate) type_vars: Vec<TypeVarContainer>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) operations: Vec<OperationDef>,
    pub(crate) units: Vec<CompilationUnit>,
    /// Qualified name -> raw type. First writer wins.
    pub(crate) by_name: HashMap<Name, TypeId>,
    pub(crate) lazy_hooks: HashMap<NodeKey, LazyInit>,
    pub(crate) loader: Option<Box<dyn TypeLoader>>,
    pub(crate) options: ResolutionOptions,
    pub(crate) root: TypeId,
    pub(crate) root_exception: TypeId,
    pub(crate) unbounded_wildcard: TypeId,
}

impl fmt::Debug for CodeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeModel")
            .field("types", &self.types.len())
            .field("cached", &self.by_name.len())
            .field("units", &self.units.len())
            .field("has_loader", &self.loader.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for CodeModel {
    fn default() -> Self {
        Self::new(ResolutionOptions::default(), None)
    }
}

impl CodeModel {
    pub fn new(options: ResolutionOptions, loader: Option<Box<dyn TypeLoader>>) -> Self {
        let placeholder = TypeId::from_raw(0);
        let mut model = Self {
            types: Vec::new(),
            type_vars: Vec::new(),
            fields: Vec::new(),
            operations: Vec::new(),
            units: Vec::new(),
            by_name: HashMap::new(),
            lazy_hooks: HashMap::new(),
            loader,
            options,
            root: placeholder,
            root_exception: placeholder,
            unbounded_wildcard: placeholder,
        };

        let wildcard = model.alloc_type(TypeKind::Wildcard(TypeWildcard {
            bound: None,
            is_super: false,
            origin: None,
        }));
        model.node_mut(wildcard).lifecycle = Lifecycle::system();
        model.unbounded_wildcard = wildcard;

        let root_name = model.options.root_type.clone();
        model.root = model.system_type(&root_name);
        let exception_name = model.options.root_exception_type.clone();
        model.root_exception = model.system_type(&exception_name);
        model
    }

    /// A type the model cannot work without; declared even when no loader knows it.
    fn system_type(&mut self, qualified_name: &str) -> TypeId {
        if let Some(id) = self.get_type(qualified_name) {
            return id;
        }
        tracing::debug!(
            target: "jmodel.types",
            name = qualified_name,
            "system type not found by the loader; using a placeholder"
        );
        let id = self.create_placeholder_type(qualified_name);
        if let Some(raw) = self.raw_mut(id) {
            raw.declared = true;
        }
        id
    }

    pub fn options(&self) -> &ResolutionOptions {
        &self.options
    }

    pub fn set_loader(&mut self, loader: Option<Box<dyn TypeLoader>>) {
        self.loader = loader;
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Cached raw type, without consulting the loader.
    pub fn cached_type(&self, qualified_name: &str) -> Option<TypeId> {
        self.by_name.get(qualified_name).copied()
    }

    /// The raw type named `qualified_name`: from the cache, else from the loader. Loader misses
    /// are absorbed.
    pub fn get_type(&mut self, qualified_name: &str) -> Option<TypeId> {
        if let Some(id) = self.cached_type(qualified_name) {
            return Some(id);
        }
        if is_primitive(qualified_name) {
            return Some(self.create_placeholder_type(qualified_name));
        }
        let mirror = self
            .loader
            .as_ref()
            .and_then(|loader| loader.load(qualified_name));
        match mirror {
            Some(mirror) => {
                let id = self.create_type_from_mirror(mirror);
                self.by_name.entry(Name::from(qualified_name)).or_insert(id);
                Some(id)
            }
            None => {
                tracing::debug!(target: "jmodel.types", name = qualified_name, "type not found");
                None
            }
        }
    }

    /// Like [`CodeModel::get_type`], creating an undeclared placeholder on a miss when
    /// `allow_create` is set.
    pub fn get_or_create_type(&mut self, qualified_name: &str, allow_create: bool) -> Option<TypeId> {
        if let Some(id) = self.get_type(qualified_name) {
            return Some(id);
        }
        if !allow_create {
            return None;
        }
        tracing::debug!(
            target: "jmodel.types",
            name = qualified_name,
            "creating placeholder for unknown type"
        );
        Some(self.create_placeholder_type(qualified_name))
    }

    pub fn root_type(&self) -> TypeId {
        self.root
    }

    pub fn root_exception_type(&self) -> TypeId {
        self.root_exception
    }

    pub fn unbounded_wildcard(&self) -> TypeId {
        self.unbounded_wildcard
    }

    /// `boolean`, or its wrapper class.
    pub fn boolean_type(&mut self, primitive: bool) -> TypeId {
        let name = if primitive {
            "boolean"
        } else {
            "java.lang.Boolean"
        };
        self.get_type(name)
            .unwrap_or_else(|| self.create_placeholder_type(name))
    }

    pub fn create_unit(&mut self, package: Option<&str>) -> UnitId {
        let id = UnitId::from_raw(self.units.len());
        self.units.push(CompilationUnit {
            package: package.filter(|p| !p.is_empty()).map(Name::from),
            ..CompilationUnit::default()
        });
        id
    }

    pub fn unit(&self, id: UnitId) -> &CompilationUnit {
        &self.units[id.idx()]
    }

    pub fn add_import(&mut self, unit: UnitId, name: &str, on_demand: bool, is_static: bool) {
        let imports = &mut self.units[unit.idx()].imports;
        let import = Import {
            name: Name::from(name),
            on_demand,
            is_static,
        };
        if !imports.contains(&import) {
            imports.push(import);
        }
    }

    /// Mark `unit` as fully loaded; with `freeze`, its types become immutable.
    pub fn finish_unit(&mut self, unit: UnitId, freeze: bool) {
        self.units[unit.idx()].finished = true;
        if !freeze {
            return;
        }
        let types = self.units[unit.idx()].types.clone();
        for ty in types {
            self.set_immutable(ty.into());
        }
        tracing::debug!(target: "jmodel.types", unit = unit.idx(), "compilation unit frozen");
    }

    /// Qualify `simple_name` as seen from `unit` and `scope`.
    ///
    /// Lookup order: primitives, the enclosing types and their member types, single-type
    /// imports, the unit's package, on-demand imports, `java.lang`. Names found nowhere are
    /// placed in the unit's package.
    pub fn qualified_name_for(
        &mut self,
        simple_name: &str,
        unit: Option<UnitId>,
        scope: Option<TypeVarOwner>,
    ) -> Name {
        if is_primitive(simple_name) {
            return Name::from(simple_name);
        }

        let mut enclosing = scope.map(|scope| match scope {
            TypeVarOwner::Type(ty) => ty,
            TypeVarOwner::Operation(op) => self.operations[op.idx()].declaring_type,
        });
        while let Some(ty) = enclosing {
            if let Some(raw) = self.raw(ty) {
                if raw.name == simple_name {
                    return raw.qualified_name.clone();
                }
            }
            if let Some(nested) = self.nested_type(ty, simple_name) {
                if let Some(raw) = self.raw(nested) {
                    return raw.qualified_name.clone();
                }
            }
            enclosing = self.declaring_type(ty);
        }

        let (package, imports) = match unit {
            Some(unit) => {
                let unit = &self.units[unit.idx()];
                (unit.package.clone(), unit.imports.clone())
            }
            None => (None, Vec::new()),
        };

        if let Some(import) = imports
            .iter()
            .find(|import| !import.on_demand && simple_name_of(&import.name) == simple_name)
        {
            return import.name.clone();
        }

        let in_package = join_qualified(package.as_deref(), simple_name);
        if self.get_type(&in_package).is_some() {
            return in_package;
        }

        for import in imports.iter().filter(|import| import.on_demand) {
            let candidate = join_qualified(Some(&import.name), simple_name);
            if self.get_type(&candidate).is_some() {
                return candidate;
            }
        }

        let lang = join_qualified(Some(JAVA_LANG), simple_name);
        if self.get_type(&lang).is_some() {
            return lang;
        }

        in_package
    }

    /// Resolve a dotted name: fully qualified, or a visible type followed by member types
    /// (`Map.Entry`).
    pub fn resolve_dotted_name(
        &mut self,
        name: &str,
        unit: Option<UnitId>,
        scope: Option<TypeVarOwner>,
    ) -> Option<TypeId> {
        if let Some(id) = self.get_type(name) {
            return Some(id);
        }
        if let Some((head, rest)) = name.split_once('.') {
            let head = self.qualified_name_for(head, unit, scope);
            if let Some(mut current) = self.get_type(&head) {
                let mut found = true;
                for segment in rest.split('.') {
                    let qualified = format!("{}.{segment}", self.describe(current.into()));
                    match self
                        .nested_type(current, segment)
                        .or_else(|| self.get_type(&qualified))
                    {
                        Some(next) => current = next,
                        None => {
                            found = false;
                            break;
                        }
                    }
                }
                if found {
                    return Some(current);
                }
            }
        }
        let allow = self.options.allow_create_missing;
        self.get_or_create_type(name, allow)
    }

    /// Short, non-resolving description of a node for errors and logs.
    pub fn describe(&self, key: NodeKey) -> String {
        match key {
            NodeKey::Type(id) => match self.kind(id) {
                TypeKind::Raw(raw) => raw.qualified_name.to_string(),
                TypeKind::Variable(var) => var.name.to_string(),
                TypeKind::Source(source) => source.raw_name.to_string(),
                TypeKind::Proxy(proxy) => self.describe(proxy.delegate.into()),
                TypeKind::Array(array) => format!("{}[]", self.describe(array.component.into())),
                TypeKind::Parameterized(p) => format!("{}<..>", self.describe(p.base.into())),
                TypeKind::Wildcard(_) => "?".to_string(),
                TypeKind::Composed(c) => c
                    .parts
                    .iter()
                    .map(|part| self.describe((*part).into()))
                    .collect::<Vec<_>>()
                    .join("&"),
            },
            NodeKey::TypeVars(id) => {
                let owner = self.type_vars[id.idx()].owner;
                format!("type variables of {}", self.describe(owner.into()))
            }
            NodeKey::Field(id) => {
                let field = &self.fields[id.idx()];
                format!("{}.{}", self.describe(field.declaring_type.into()), field.name)
            }
            NodeKey::Operation(id) => {
                let op = &self.operations[id.idx()];
                format!("{}.{}()", self.describe(op.declaring_type.into()), op.name)
            }
        }
    }

    pub fn kind_label(&self, key: NodeKey) -> &'static str {
        match key {
            NodeKey::Type(id) => self.kind(id).label(),
            NodeKey::TypeVars(_) => "type variable container",
            NodeKey::Field(_) => "field",
            NodeKey::Operation(id) => match self.operations[id.idx()].kind {
                OperationKind::Method => "method",
                OperationKind::Constructor => "constructor",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::TypeCategory;

    #[test]
    fn system_types_exist_without_a_loader() {
        let mut model = CodeModel::default();
        let root = model.root_type();
        assert_eq!(model.describe(root.into()), "java.lang.Object");
        assert_eq!(model.get_type("java.lang.Object"), Some(root));
        assert_eq!(
            model.describe(model.root_exception_type().into()),
            "java.lang.Throwable"
        );
        let boolean = model.boolean_type(true);
        assert_eq!(model.get_type("boolean"), Some(boolean));
        assert_eq!(model.category(boolean), TypeCategory::Primitive);
    }

    #[test]
    fn qualification_prefers_imports_over_the_package() {
        let mut model = CodeModel::default();
        let unit = model.create_unit(Some("app"));
        model.add_import(unit, "lib.Widget", false, false);
        model
            .declare_type("app.Widget", TypeCategory::Class, None)
            .unwrap();
        model
            .declare_type("app.Local", TypeCategory::Class, None)
            .unwrap();
        model.declare_type("util.Tool", TypeCategory::Class, None).unwrap();
        model.add_import(unit, "util", true, false);

        assert_eq!(model.qualified_name_for("Widget", Some(unit), None), "lib.Widget");
        assert_eq!(model.qualified_name_for("Local", Some(unit), None), "app.Local");
        assert_eq!(model.qualified_name_for("Tool", Some(unit), None), "util.Tool");
        assert_eq!(model.qualified_name_for("Object", Some(unit), None), "java.lang.Object");
        assert_eq!(model.qualified_name_for("Missing", Some(unit), None), "app.Missing");
        assert_eq!(model.qualified_name_for("int", Some(unit), None), "int");
    }

    #[test]
    fn member_types_are_visible_from_their_outer_type() {
        let mut model = CodeModel::default();
        let unit = model.create_unit(Some("app"));
        let outer = model
            .declare_type("app.Outer", TypeCategory::Class, Some(unit))
            .unwrap();
        let inner = model
            .declare_nested_type(outer, "Inner", TypeCategory::Class)
            .unwrap();
        let method = model.add_method(outer, "make").unwrap();

        assert_eq!(
            model.qualified_name_for("Inner", Some(unit), Some(method.into())),
            "app.Outer.Inner"
        );
        assert_eq!(
            model.resolve_dotted_name("Outer.Inner", Some(unit), None),
            Some(inner)
        );
    }

    #[test]
    fn finishing_a_unit_freezes_its_types() {
        let mut model = CodeModel::default();
        let unit = model.create_unit(Some("app"));
        let ty = model
            .declare_type("app.Done", TypeCategory::Class, Some(unit))
            .unwrap();
        model.finish_unit(unit, true);

        assert!(model.unit(unit).is_finished());
        assert!(model.is_immutable(ty.into()));
        assert!(model.add_method(ty, "late").is_err());
    }
}
