//! End-to-end tests for the attribute runtime: application across all four
//! attachment kinds, stacking, strict-mode validation, lifecycle events,
//! and registry lookups through the reflection facades.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use reflectkit::{
    AttachmentKind, Attribute, AttributeHandler, AttributeTarget, ClassAttachment, ClassBuilder,
    ClassId, MethodAttachment, Outcome, ParameterAttachment, PropertyAttachment, ReflectError,
    Reflection,
};

/// Handler accepting every attachment kind, recording what it saw.
#[derive(Default)]
struct Anywhere {
    note: String,
    seen: Mutex<Vec<AttachmentKind>>,
}

impl Anywhere {
    fn labelled(note: &str) -> Self {
        Self {
            note: note.to_string(),
            ..Self::default()
        }
    }
}

impl AttributeHandler for Anywhere {
    fn on_class(&mut self, _event: &ClassAttachment<'_>) -> Outcome {
        self.seen.lock().push(AttachmentKind::Class);
        Outcome::Applied
    }

    fn on_method(&mut self, _event: &MethodAttachment<'_>) -> Outcome {
        self.seen.lock().push(AttachmentKind::Method);
        Outcome::Applied
    }

    fn on_property(&mut self, _event: &PropertyAttachment<'_>) -> Outcome {
        self.seen.lock().push(AttachmentKind::Property);
        Outcome::Applied
    }

    fn on_parameter(&mut self, _event: &ParameterAttachment<'_>) -> Outcome {
        self.seen.lock().push(AttachmentKind::Parameter);
        Outcome::Applied
    }
}

/// Method-only handler that inspects the resolved facade.
#[derive(Debug)]
struct Route {
    path: String,
    param_count: usize,
}

impl Route {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            param_count: 0,
        }
    }
}

impl AttributeHandler for Route {
    fn on_method(&mut self, event: &MethodAttachment<'_>) -> Outcome {
        self.param_count = event.reflection.get_parameters().len();
        Outcome::Applied
    }
}

/// Parameter-only handler that tags its target with metadata.
#[derive(Debug)]
struct Inject {
    token: String,
}

impl AttributeHandler for Inject {
    fn on_parameter(&mut self, event: &ParameterAttachment<'_>) -> Outcome {
        event.reflection.define_meta("inject", json!(self.token));
        Outcome::Applied
    }
}

/// Handler with no callbacks at all; unsupported everywhere.
#[derive(Debug)]
struct Inert;

impl AttributeHandler for Inert {}

fn controller(rx: &Reflection) -> ClassId {
    ClassBuilder::new("UserController")
        .source("class UserController { constructor(service, limit = 25) {} }")
        .method("index", "index(request, page = 1) {}")
        .property("service")
        .register(rx)
        .unwrap()
}

#[test]
fn test_apply_to_all_four_kinds() {
    let rx = Reflection::new();
    let id = controller(&rx);

    let attr: Attribute<Anywhere> = Attribute::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);
    attr.events().on_attached(move |event| {
        sink.lock().push(event.kind);
    });

    let on_class = attr.apply_to_class(&rx, id, Anywhere::labelled("c")).unwrap();
    assert_eq!(*on_class.seen.lock(), vec![AttachmentKind::Class]);
    attr.apply_to_method(&rx, id, "index", Anywhere::labelled("m"))
        .unwrap();
    attr.apply_to_property(&rx, id, "service", Anywhere::labelled("p"))
        .unwrap();
    attr.apply_to_constructor_parameter(&rx, id, 0, Anywhere::labelled("a"))
        .unwrap();

    assert_eq!(
        *order.lock(),
        vec![
            AttachmentKind::Class,
            AttachmentKind::Method,
            AttachmentKind::Property,
            AttachmentKind::Parameter,
        ]
    );
    assert_eq!(rx.attributes().len(), 4);

    // Each facade sees exactly its own attachment.
    let class = rx.class(id).unwrap();
    assert!(class.has_attribute::<Anywhere>());
    assert_eq!(class.get_attribute::<Anywhere>().unwrap().note, "c");

    let method = class.get_method("index").unwrap();
    assert_eq!(method.get_attribute::<Anywhere>().unwrap().note, "m");

    let property = class.get_property("service").unwrap();
    assert_eq!(property.get_attribute::<Anywhere>().unwrap().note, "p");

    let parameter = class
        .get_constructor_method()
        .get_parameter_at(0)
        .unwrap();
    assert_eq!(parameter.get_attribute::<Anywhere>().unwrap().note, "a");
    assert!(!class
        .get_constructor_method()
        .get_parameter_at(1)
        .unwrap()
        .has_attribute::<Anywhere>());
}

#[test]
fn test_kind_channel_fires_after_generic() {
    let rx = Reflection::new();
    let id = controller(&rx);

    let attr: Attribute<Anywhere> = Attribute::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    attr.events().on_attached(move |_| sink.lock().push("any"));
    let sink = Arc::clone(&log);
    attr.events()
        .on_class_attached(move |_| sink.lock().push("class"));
    let sink = Arc::clone(&log);
    attr.events()
        .on_method_attached(move |_| sink.lock().push("method"));

    attr.apply_to_class(&rx, id, Anywhere::default()).unwrap();
    assert_eq!(*log.lock(), vec!["any", "class"]);

    log.lock().clear();
    attr.apply_to_method(&rx, id, "index", Anywhere::default())
        .unwrap();
    assert_eq!(*log.lock(), vec!["any", "method"]);
}

#[test]
fn test_stacking_preserves_order_and_most_recent_wins() {
    let rx = Reflection::new();
    let id = controller(&rx);
    let attr: Attribute<Route> = Attribute::new();

    attr.apply_to_method(&rx, id, "index", Route::new("/users"))
        .unwrap();
    attr.apply_to_method(&rx, id, "index", Route::new("/users/v2"))
        .unwrap();

    let class = rx.class(id).unwrap();
    let method = class.get_method("index").unwrap();

    let routes = method.get_attributes_of::<Route>();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].path, "/users");
    assert_eq!(routes[1].path, "/users/v2");

    assert_eq!(method.get_attribute::<Route>().unwrap().path, "/users/v2");
}

#[test]
fn test_handler_sees_resolved_facade() {
    let rx = Reflection::new();
    let id = controller(&rx);
    let attr: Attribute<Route> = Attribute::new();

    let instance = attr
        .apply_to_method(&rx, id, "index", Route::new("/users"))
        .unwrap();
    assert_eq!(instance.param_count, 2);
}

#[test]
fn test_strict_rejects_unsupported_kind() {
    let rx = Reflection::new();
    let id = controller(&rx);

    let attr: Attribute<Inert> = Attribute::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    attr.events().on_attached(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = attr.apply_to_class(&rx, id, Inert).unwrap_err();
    match err {
        ReflectError::UnsupportedAttachment { attribute, target } => {
            assert_eq!(attribute, "Inert");
            assert_eq!(target, "class UserController");
        }
        other => panic!("unexpected error: {other}"),
    }

    // A rejected attachment never reaches the registry or subscribers.
    assert!(rx.attributes().is_empty());
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    let route: Attribute<Route> = Attribute::new();
    let err = route
        .apply_to_property(&rx, id, "service", Route::new("/users"))
        .unwrap_err();
    assert!(matches!(err, ReflectError::UnsupportedAttachment { .. }));
}

#[test]
fn test_lenient_mode_is_silent_noop() {
    let rx = Reflection::new();
    let id = controller(&rx);
    rx.set_strict(false);

    let attr: Attribute<Inert> = Attribute::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    attr.events().on_attached(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    attr.apply_to_class(&rx, id, Inert).unwrap();

    assert!(rx.attributes().is_empty());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!rx.class(id).unwrap().has_attribute::<Inert>());
}

#[test]
fn test_unresolvable_target_is_a_build_failure() {
    let rx = Reflection::new();
    let id = controller(&rx);
    let attr: Attribute<Route> = Attribute::new();

    let err = attr
        .apply_to_method(&rx, id, "missing", Route::new("/nope"))
        .unwrap_err();
    match err {
        ReflectError::ReflectionBuildFailed { attribute, target } => {
            assert_eq!(attribute, "Route");
            assert_eq!(target, "method UserController::missing");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Unknown class and out-of-range parameter index fail the same way.
    // An id minted by another context is unknown here.
    let other = Reflection::new();
    ClassBuilder::new("Filler").register(&other).unwrap();
    let foreign = ClassBuilder::new("Foreign").register(&other).unwrap();
    let err = attr
        .apply_to_method(&rx, foreign, "index", Route::new("/x"))
        .unwrap_err();
    assert!(matches!(err, ReflectError::ReflectionBuildFailed { .. }));

    let inject: Attribute<Inject> = Attribute::new();
    let err = inject
        .apply_to_constructor_parameter(
            &rx,
            id,
            9,
            Inject {
                token: "db".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ReflectError::ReflectionBuildFailed { .. }));
    assert!(rx.attributes().is_empty());
}

#[test]
fn test_parameter_attribute_writes_metadata() {
    let rx = Reflection::new();
    let id = controller(&rx);
    let attr: Attribute<Inject> = Attribute::new();

    attr.apply_to_constructor_parameter(
        &rx,
        id,
        0,
        Inject {
            token: "user-service".to_string(),
        },
    )
    .unwrap();

    let class = rx.class(id).unwrap();
    let parameter = class.get_constructor_method().get_parameter_at(0).unwrap();
    assert_eq!(parameter.get_meta("inject"), Some(json!("user-service")));
    assert!(parameter.has_attribute::<Inject>());
}

#[test]
fn test_reverse_lookup_across_classes() {
    let rx = Reflection::new();
    let first = controller(&rx);
    let second = ClassBuilder::new("AdminController")
        .method("index", "index(request) {}")
        .register(&rx)
        .unwrap();

    let attr: Attribute<Route> = Attribute::new();
    attr.apply_to_method(&rx, first, "index", Route::new("/users"))
        .unwrap();
    attr.apply_to_method(&rx, second, "index", Route::new("/admin"))
        .unwrap();

    let found = rx.attributes().instances_of::<Route>();
    assert_eq!(found.len(), 2);
    assert_eq!(
        found[0].0,
        AttributeTarget::Method {
            class: first,
            method: "index".to_string(),
        }
    );
    assert_eq!(found[0].1.path, "/users");
    assert_eq!(found[1].1.path, "/admin");
}

#[test]
fn test_inherited_members_see_ancestor_attributes() {
    let rx = Reflection::new();
    let base = ClassBuilder::new("Repository")
        .method("save", "save(entity, overwrite = false) {}")
        .property("connection")
        .register(&rx)
        .unwrap();
    let derived = ClassBuilder::new("UserRepository")
        .extends(base)
        .register(&rx)
        .unwrap();

    let attr: Attribute<Route> = Attribute::new();
    attr.apply_to_method(&rx, base, "save", Route::new("/save"))
        .unwrap();

    // The attribute was attached at the declaring class; the subclass
    // facade's inherited method still sees it.
    let child = rx.class(derived).unwrap();
    let save = child.get_method("save").unwrap();
    assert!(save.is_inherited());
    assert!(save.has_attribute::<Route>());
    assert_eq!(save.get_attribute::<Route>().unwrap().path, "/save");

    // Applying through the subclass facade records against the declaring
    // class too, so both views agree and stacking order is preserved.
    attr.apply_to_method(&rx, derived, "save", Route::new("/save/v2"))
        .unwrap();
    let routes = save.get_attributes_of::<Route>();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[1].path, "/save/v2");

    let parent_save = rx.class(base).unwrap().get_method("save").unwrap();
    assert_eq!(parent_save.get_attributes_of::<Route>().len(), 2);
    assert_eq!(
        parent_save.get_attribute::<Route>().unwrap().path,
        "/save/v2"
    );

    // Same identity rules for inherited properties and for metadata.
    let marker: Attribute<Anywhere> = Attribute::new();
    marker
        .apply_to_property(&rx, derived, "connection", Anywhere::labelled("conn"))
        .unwrap();
    let parent_prop = rx.class(base).unwrap().get_property("connection").unwrap();
    assert_eq!(parent_prop.get_attribute::<Anywhere>().unwrap().note, "conn");
    assert!(child.get_property("connection").unwrap().has_attribute::<Anywhere>());

    save.define_meta("audited", json!(true));
    assert_eq!(parent_save.get_meta("audited"), Some(json!(true)));
}

#[test]
fn test_global_context_reset() {
    let rx = Reflection::global();
    let id = ClassBuilder::new("GlobalResetProbe")
        .method("run", "run(task) {}")
        .register(rx)
        .unwrap();

    let attr: Attribute<Route> = Attribute::new();
    attr.apply_to_method(rx, id, "run", Route::new("/probe"))
        .unwrap();
    assert!(rx.contains(id));
    assert!(!rx.attributes().is_empty());

    rx.reset();
    assert!(!rx.contains(id));
    assert!(rx.attributes().is_empty());
    assert!(rx.is_strict());
}
