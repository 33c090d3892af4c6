//! Built-in mirrors for a handful of platform types.

use jmodel_types::{
    ClassMirror, FieldMirror, MethodMirror, Modifiers, TypeCategory, TypeSig, TypeVarMirror,
};

const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";

pub(crate) fn builtin_mirrors() -> Vec<ClassMirror> {
    vec![
        object(),
        class(
            "java.lang.String",
            Modifiers::PUBLIC | Modifiers::FINAL,
            Some(TypeSig::class(OBJECT)),
            vec![
                TypeSig::class("java.io.Serializable"),
                TypeSig::parameterized("java.lang.Comparable", vec![TypeSig::class(STRING)]),
                TypeSig::class("java.lang.CharSequence"),
            ],
            vec![
                method("length", vec![], Some(TypeSig::class("int"))),
                method("isEmpty", vec![], Some(TypeSig::class("boolean"))),
                method(
                    "charAt",
                    vec![TypeSig::class("int")],
                    Some(TypeSig::class("char")),
                ),
                method(
                    "substring",
                    vec![TypeSig::class("int"), TypeSig::class("int")],
                    Some(TypeSig::class(STRING)),
                ),
            ],
        ),
        interface(
            "java.lang.CharSequence",
            vec![],
            vec![],
            vec![
                method("length", vec![], Some(TypeSig::class("int"))),
                method(
                    "charAt",
                    vec![TypeSig::class("int")],
                    Some(TypeSig::class("char")),
                ),
            ],
        ),
        interface(
            "java.lang.Comparable",
            vec![object_bounded("T")],
            vec![],
            vec![method(
                "compareTo",
                vec![TypeSig::var("T")],
                Some(TypeSig::class("int")),
            )],
        ),
        interface(
            "java.lang.Iterable",
            vec![object_bounded("T")],
            vec![],
            vec![method(
                "iterator",
                vec![],
                Some(TypeSig::parameterized(
                    "java.util.Iterator",
                    vec![TypeSig::var("T")],
                )),
            )],
        ),
        interface("java.lang.AutoCloseable", vec![], vec![], vec![close()]),
        class(
            "java.lang.Number",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            Some(TypeSig::class(OBJECT)),
            vec![TypeSig::class("java.io.Serializable")],
            vec![
                method("intValue", vec![], Some(TypeSig::class("int"))),
                method("longValue", vec![], Some(TypeSig::class("long"))),
                method("doubleValue", vec![], Some(TypeSig::class("double"))),
            ],
        ),
        boxed("java.lang.Integer", "int", Some("java.lang.Number")),
        boxed("java.lang.Long", "long", Some("java.lang.Number")),
        boxed("java.lang.Boolean", "boolean", None),
        throwable(),
        exception("java.lang.Exception", "java.lang.Throwable"),
        exception("java.lang.RuntimeException", "java.lang.Exception"),
        exception("java.io.IOException", "java.lang.Exception"),
        enum_base(),
        interface("java.io.Serializable", vec![], vec![], vec![]),
        interface(
            "java.io.Closeable",
            vec![],
            vec![TypeSig::class("java.lang.AutoCloseable")],
            vec![close()],
        ),
        interface(
            "java.util.Iterator",
            vec![object_bounded("E")],
            vec![],
            vec![
                method("hasNext", vec![], Some(TypeSig::class("boolean"))),
                method("next", vec![], Some(TypeSig::var("E"))),
            ],
        ),
        interface(
            "java.util.Collection",
            vec![object_bounded("E")],
            vec![TypeSig::parameterized(
                "java.lang.Iterable",
                vec![TypeSig::var("E")],
            )],
            vec![
                method("size", vec![], Some(TypeSig::class("int"))),
                method(
                    "add",
                    vec![TypeSig::var("E")],
                    Some(TypeSig::class("boolean")),
                ),
            ],
        ),
        interface(
            "java.util.List",
            vec![object_bounded("E")],
            vec![TypeSig::parameterized(
                "java.util.Collection",
                vec![TypeSig::var("E")],
            )],
            vec![method(
                "get",
                vec![TypeSig::class("int")],
                Some(TypeSig::var("E")),
            )],
        ),
        array_list(),
        interface(
            "java.util.Map",
            vec![object_bounded("K"), object_bounded("V")],
            vec![],
            vec![
                method("get", vec![TypeSig::class(OBJECT)], Some(TypeSig::var("V"))),
                method(
                    "put",
                    vec![TypeSig::var("K"), TypeSig::var("V")],
                    Some(TypeSig::var("V")),
                ),
                method(
                    "entrySet",
                    vec![],
                    Some(TypeSig::parameterized(
                        "java.util.Set",
                        vec![TypeSig::parameterized(
                            "java.util.Map.Entry",
                            vec![TypeSig::var("K"), TypeSig::var("V")],
                        )],
                    )),
                ),
            ],
        ),
        map_entry(),
        interface(
            "java.util.Set",
            vec![object_bounded("E")],
            vec![TypeSig::parameterized(
                "java.util.Collection",
                vec![TypeSig::var("E")],
            )],
            vec![],
        ),
    ]
}

fn object_bounded(name: &str) -> TypeVarMirror {
    TypeVarMirror::new(name, vec![TypeSig::class(OBJECT)])
}

fn method(name: &str, params: Vec<TypeSig>, return_type: Option<TypeSig>) -> MethodMirror {
    MethodMirror {
        name: name.to_string(),
        modifiers: Modifiers::PUBLIC,
        type_params: Vec::new(),
        params,
        return_type,
        throws: Vec::new(),
    }
}

fn constructor(params: Vec<TypeSig>) -> MethodMirror {
    MethodMirror {
        name: "<init>".to_string(),
        modifiers: Modifiers::PUBLIC,
        type_params: Vec::new(),
        params,
        return_type: None,
        throws: Vec::new(),
    }
}

fn close() -> MethodMirror {
    let mut close = method("close", vec![], None);
    close.modifiers |= Modifiers::ABSTRACT;
    close.throws.push(TypeSig::class("java.lang.Exception"));
    close
}

fn class(
    name: &str,
    modifiers: Modifiers,
    superclass: Option<TypeSig>,
    interfaces: Vec<TypeSig>,
    methods: Vec<MethodMirror>,
) -> ClassMirror {
    let mut mirror = ClassMirror::new(name, TypeCategory::Class);
    mirror.modifiers = modifiers;
    mirror.superclass = superclass;
    mirror.interfaces = interfaces;
    mirror.methods = methods;
    mirror
}

fn interface(
    name: &str,
    type_params: Vec<TypeVarMirror>,
    interfaces: Vec<TypeSig>,
    methods: Vec<MethodMirror>,
) -> ClassMirror {
    let mut mirror = ClassMirror::new(name, TypeCategory::Interface);
    mirror.modifiers = Modifiers::PUBLIC | Modifiers::ABSTRACT;
    mirror.type_params = type_params;
    mirror.interfaces = interfaces;
    mirror.methods = methods
        .into_iter()
        .map(|mut method| {
            method.modifiers |= Modifiers::ABSTRACT;
            method
        })
        .collect();
    mirror
}

fn object() -> ClassMirror {
    let mut mirror = class(
        OBJECT,
        Modifiers::PUBLIC,
        None,
        vec![],
        vec![
            method(
                "equals",
                vec![TypeSig::class(OBJECT)],
                Some(TypeSig::class("boolean")),
            ),
            method("hashCode", vec![], Some(TypeSig::class("int"))),
            method("toString", vec![], Some(TypeSig::class(STRING))),
        ],
    );
    mirror.constructors.push(constructor(vec![]));
    mirror
}

fn boxed(name: &str, primitive: &str, superclass: Option<&str>) -> ClassMirror {
    let mut mirror = class(
        name,
        Modifiers::PUBLIC | Modifiers::FINAL,
        Some(TypeSig::class(superclass.unwrap_or(OBJECT))),
        vec![TypeSig::parameterized(
            "java.lang.Comparable",
            vec![TypeSig::class(name)],
        )],
        vec![method(
            "valueOf",
            vec![TypeSig::class(primitive)],
            Some(TypeSig::class(name)),
        )],
    );
    for method in &mut mirror.methods {
        method.modifiers |= Modifiers::STATIC;
    }
    mirror.fields.push(FieldMirror {
        name: "TYPE".to_string(),
        modifiers: Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
        ty: TypeSig::parameterized("java.lang.Class", vec![TypeSig::class(name)]),
    });
    mirror
}

fn throwable() -> ClassMirror {
    let mut mirror = class(
        "java.lang.Throwable",
        Modifiers::PUBLIC,
        Some(TypeSig::class(OBJECT)),
        vec![TypeSig::class("java.io.Serializable")],
        vec![
            method("getMessage", vec![], Some(TypeSig::class(STRING))),
            method(
                "getCause",
                vec![],
                Some(TypeSig::class("java.lang.Throwable")),
            ),
        ],
    );
    mirror.constructors.push(constructor(vec![]));
    mirror
        .constructors
        .push(constructor(vec![TypeSig::class(STRING)]));
    mirror
}

fn exception(name: &str, superclass: &str) -> ClassMirror {
    let mut mirror = class(
        name,
        Modifiers::PUBLIC,
        Some(TypeSig::class(superclass)),
        vec![],
        vec![],
    );
    mirror.constructors.push(constructor(vec![]));
    mirror
        .constructors
        .push(constructor(vec![TypeSig::class(STRING)]));
    mirror
}

/// `Enum<E extends Enum<E>>`
fn enum_base() -> ClassMirror {
    let mut mirror = class(
        "java.lang.Enum",
        Modifiers::PUBLIC | Modifiers::ABSTRACT,
        Some(TypeSig::class(OBJECT)),
        vec![
            TypeSig::parameterized("java.lang.Comparable", vec![TypeSig::var("E")]),
            TypeSig::class("java.io.Serializable"),
        ],
        vec![
            method("name", vec![], Some(TypeSig::class(STRING))),
            method("ordinal", vec![], Some(TypeSig::class("int"))),
        ],
    );
    mirror.type_params.push(TypeVarMirror::new(
        "E",
        vec![TypeSig::parameterized(
            "java.lang.Enum",
            vec![TypeSig::var("E")],
        )],
    ));
    mirror
}

fn array_list() -> ClassMirror {
    let mut mirror = class(
        "java.util.ArrayList",
        Modifiers::PUBLIC,
        Some(TypeSig::class(OBJECT)),
        vec![
            TypeSig::parameterized("java.util.List", vec![TypeSig::var("E")]),
            TypeSig::class("java.io.Serializable"),
        ],
        vec![],
    );
    mirror.type_params.push(object_bounded("E"));
    mirror.constructors.push(constructor(vec![]));
    mirror
        .constructors
        .push(constructor(vec![TypeSig::class("int")]));
    mirror
}

fn map_entry() -> ClassMirror {
    let mut mirror = interface(
        "java.util.Map.Entry",
        vec![object_bounded("K"), object_bounded("V")],
        vec![],
        vec![
            method("getKey", vec![], Some(TypeSig::var("K"))),
            method("getValue", vec![], Some(TypeSig::var("V"))),
        ],
    );
    mirror.modifiers |= Modifiers::STATIC;
    mirror.declaring_type = Some("java.util.Map".to_string());
    mirror
}
