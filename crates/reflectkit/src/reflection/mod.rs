//! Reflection Facades
//!
//! Facades are cheap read-only views built on demand from a
//! [`Reflection`](crate::Reflection) context. A [`ReflectionClass`] merges
//! the method and property rosters across the inheritance chain; methods
//! hand out [`ReflectionParameter`] views backed by the declaration parser.
//!
//! Each facade caches what it computes (rosters, extracted parameters) for
//! its own lifetime and is never invalidated. Build a fresh facade to
//! observe declarations registered later.

mod class;
mod filters;
mod method;
mod parameter;
mod property;

pub use class::ReflectionClass;
pub use filters::{MethodFilter, ParameterFilter, PropertyFilter};
pub use method::ReflectionMethod;
pub use parameter::ReflectionParameter;
pub use property::ReflectionProperty;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Reflection;
    use crate::declaration::{ClassBuilder, ClassId, MethodDecl, TypeHint};

    fn sample(rx: &Reflection) -> (ClassId, ClassId) {
        let base = ClassBuilder::new("Repository")
            .source("class Repository { constructor(connection, timeout = 30) {} }")
            .method("find", "find(id) { return this.rows[id]; }")
            .method("save", "save(entity, overwrite = false) {}")
            .property("connection")
            .register(rx)
            .unwrap();

        let derived = ClassBuilder::new("UserRepository")
            .extends(base)
            .source("class UserRepository extends Repository {}")
            .method_decl(
                MethodDecl::new("find", "find(id) { return this.users[id]; }")
                    .param_type(TypeHint::Number)
                    .returns(TypeHint::Object),
            )
            .static_method("table", "table() { return \"users\"; }")
            .property("cache")
            .register(rx)
            .unwrap();

        (base, derived)
    }

    #[test]
    fn test_merged_methods_prefer_override() {
        let rx = Reflection::new();
        let (base, derived) = sample(&rx);

        let class = rx.class(derived).unwrap();
        let find = class.get_method("find").unwrap();
        assert!(!find.is_inherited());
        assert_eq!(find.declaring_class_id(), derived);
        assert!(find.is_typed());

        let save = class.get_method("save").unwrap();
        assert!(save.is_inherited());
        assert_eq!(save.declaring_class_id(), base);
    }

    #[test]
    fn test_method_filters() {
        let rx = Reflection::new();
        let (_, derived) = sample(&rx);
        let class = rx.class(derived).unwrap();

        let statics = class.get_methods_where(MethodFilter::STATIC);
        assert_eq!(statics.len(), 1);
        assert_eq!(statics[0].name(), "table");

        let own_typed = class.get_methods_where(MethodFilter::OWN | MethodFilter::TYPED);
        assert_eq!(own_typed.len(), 1);
        assert_eq!(own_typed[0].name(), "find");

        let inherited = class.get_methods_where(MethodFilter::INHERITED);
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].name(), "save");
    }

    #[test]
    fn test_constructor_always_present() {
        let rx = Reflection::new();
        let (_, derived) = sample(&rx);
        let class = rx.class(derived).unwrap();

        assert!(class.has_method("constructor"));
        let ctor = class.get_constructor_method();
        assert!(ctor.is_constructor());
        assert!(!ctor.is_static());
    }

    #[test]
    fn test_constructor_parameters_walk_hierarchy() {
        let rx = Reflection::new();
        let (_, derived) = sample(&rx);

        // UserRepository declares no constructor; Repository's is found.
        let class = rx.class(derived).unwrap();
        let params = class.get_constructor_method().get_parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "connection");
        assert!(!params[0].has_default());
        assert_eq!(params[1].name(), "timeout");
        assert!(params[1].has_default());
    }

    #[test]
    fn test_constructor_parameters_missing_everywhere() {
        let rx = Reflection::new();
        let id = ClassBuilder::new("Bare").register(&rx).unwrap();

        let class = rx.class(id).unwrap();
        assert!(class.get_constructor_method().get_parameters().is_empty());
    }

    #[test]
    fn test_method_parameters() {
        let rx = Reflection::new();
        let (base, _) = sample(&rx);
        let class = rx.class(base).unwrap();

        let save = class.get_method("save").unwrap();
        assert!(save.has_parameter("overwrite"));
        assert!(!save.has_parameter("missing"));

        let overwrite = save.get_parameter("overwrite").unwrap();
        assert_eq!(overwrite.index(), 1);
        assert!(overwrite.has_default());

        assert_eq!(save.get_parameter_at(0).unwrap().name(), "entity");
        assert!(save.get_parameter_at(5).is_none());
    }

    #[test]
    fn test_parameter_filters() {
        let rx = Reflection::new();
        let id = ClassBuilder::new("Service")
            .method_decl(
                MethodDecl::new("run", "run(input, limit = 10, extra) {}")
                    .param_type(TypeHint::Str)
                    .param_type(TypeHint::Number)
                    .param_type(TypeHint::Object),
            )
            .register(&rx)
            .unwrap();

        let class = rx.class(id).unwrap();
        let run = class.get_method("run").unwrap();

        let defaulted = run.get_parameters_where(ParameterFilter::WITH_DEFAULT);
        assert_eq!(defaulted.len(), 1);
        assert_eq!(defaulted[0].name(), "limit");

        let known = run.get_parameters_where(ParameterFilter::KNOWN_TYPE);
        assert_eq!(known.len(), 2);

        let non_primitive = run.get_parameters_where(ParameterFilter::NON_PRIMITIVE_TYPE);
        assert_eq!(non_primitive.len(), 1);
        assert_eq!(non_primitive[0].name(), "extra");

        run.get_parameter("input")
            .unwrap()
            .define_meta("inject", serde_json::json!(true));
        let with_meta = run.get_parameters_where(ParameterFilter::META);
        assert_eq!(with_meta.len(), 1);
        assert_eq!(with_meta[0].name(), "input");
    }

    #[test]
    fn test_properties_merge_and_filter() {
        let rx = Reflection::new();
        let (_, derived) = sample(&rx);
        let class = rx.class(derived).unwrap();

        let all = class.get_properties();
        assert_eq!(all.len(), 2);
        assert!(class.has_property("connection"));
        assert!(class.get_property("connection").unwrap().is_inherited());
        assert!(!class.get_property("cache").unwrap().is_inherited());

        let own = class.get_properties_where(PropertyFilter::OWN);
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].name(), "cache");
    }

    #[test]
    fn test_hierarchy_queries() {
        let rx = Reflection::new();
        let (base, derived) = sample(&rx);
        let class = rx.class(derived).unwrap();

        assert_eq!(class.hierarchy(), vec![base, derived]);
        assert!(class.is_type(derived));
        assert!(!class.is_type(base));
        assert!(class.has_ancestor_type(base));
        assert!(class.has_type(base));
        assert!(class.has_type(derived));
        assert_eq!(class.parent().unwrap().id(), base);

        let root = rx.class(base).unwrap();
        assert!(root.parent().is_none());
        assert_eq!(root.hierarchy(), vec![base]);
    }

    #[test]
    fn test_constructor_metadata_aliases_class() {
        let rx = Reflection::new();
        let (base, _) = sample(&rx);
        let class = rx.class(base).unwrap();

        class
            .get_constructor_method()
            .define_meta("scope", serde_json::json!("singleton"));

        assert_eq!(class.get_meta("scope"), Some(serde_json::json!("singleton")));
        assert!(class.get_constructor_method().has_meta("scope"));
    }

    #[test]
    fn test_property_type_string() {
        let rx = Reflection::new();
        let id = ClassBuilder::new("Config")
            .property_decl(crate::declaration::PropertyDecl::new("port").typed(TypeHint::Number))
            .property("raw")
            .register(&rx)
            .unwrap();

        let class = rx.class(id).unwrap();
        assert_eq!(class.get_property("port").unwrap().type_string(), "number");
        assert_eq!(class.get_property("raw").unwrap().type_string(), "undefined");
    }
}
