//! End-to-end binding scenarios through the public facade.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use vbind::prelude::*;
use vbind_core::{Listener, NodeKind};
use vbind_harness::Fixture;

// ── Helpers ──────────────────────────────────────────────────────────

fn mount(markup: &str, options: Options) -> (Fixture, Vm) {
    let fx = Fixture::parse(markup).expect("fixture markup");
    let root = fx.root();
    let vm = Vm::new(fx.doc().clone(), options.with_el(root)).expect("vm");
    (fx, vm)
}

fn increment(field: &'static str) -> impl Fn(&Context, &DomEvent) -> Result<()> + 'static {
    move |ctx: &Context, _ev: &DomEvent| {
        let n = ctx.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0);
        ctx.set(field, n + 1.0)
    }
}

/// Delegating tree that counts text writes per node.
#[derive(Clone)]
struct CountingTree {
    doc: Document,
    text_writes: Rc<RefCell<Vec<NodeId>>>,
}

impl CountingTree {
    fn writes_to(&self, node: NodeId) -> usize {
        self.text_writes.borrow().iter().filter(|n| **n == node).count()
    }
}

impl RenderTree for CountingTree {
    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.doc.kind(node)
    }
    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.doc.attributes(node)
    }
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.doc.set_attribute(node, name, value);
    }
    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.doc.remove_attribute(node, name);
    }
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc.children(node)
    }
    fn add_listener(&self, node: NodeId, event: &str, listener: Listener) {
        self.doc.add_listener(node, event, listener);
    }
    fn text_content(&self, node: NodeId) -> String {
        self.doc.text_content(node)
    }
    fn set_text_content(&self, node: NodeId, text: &str) {
        self.text_writes.borrow_mut().push(node);
        self.doc.set_text_content(node, text);
    }
    fn set_raw_content(&self, node: NodeId, raw: &str) {
        self.doc.set_raw_content(node, raw);
    }
    fn value(&self, node: NodeId) -> String {
        self.doc.value(node)
    }
    fn set_value(&self, node: NodeId, value: &str) {
        self.doc.set_value(node, value);
    }
    fn detach_children(&self, node: NodeId) -> NodeId {
        self.doc.detach_children(node)
    }
    fn attach_children(&self, node: NodeId, fragment: NodeId) {
        self.doc.attach_children(node, fragment);
    }
    fn query(&self, selector: &str) -> Option<NodeId> {
        self.doc.query(selector)
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Core scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn interpolation_follows_writes() {
    let (fx, vm) = mount(
        r#"<div id="app"><p>{{msg}}</p></div>"#,
        Options::new(json!({"msg": "hi"})),
    );
    assert_eq!(fx.text("p").as_deref(), Some("hi"));
    vm.set("msg", "bye").unwrap();
    assert_eq!(fx.text("p").as_deref(), Some("bye"));
}

#[test]
fn shared_nested_path_updates_every_binding() {
    let (fx, vm) = mount(
        r#"<div><p>{{ user.name }}</p><span v-text="user.name"></span></div>"#,
        Options::new(json!({"user": {"name": "a"}})),
    );
    assert_eq!(fx.text("p").as_deref(), Some("a"));
    assert_eq!(fx.text("span").as_deref(), Some("a"));

    vm.set_path("user.name", "b").unwrap();
    assert_eq!(fx.text("p").as_deref(), Some("b"));
    assert_eq!(fx.text("span").as_deref(), Some("b"));
}

#[test]
fn event_handler_increments_counter() {
    let (fx, vm) = mount(
        r#"<div><button @click="inc">+</button><b>{{count}}</b></div>"#,
        Options::new(json!({"count": 0})).with_method("inc", increment("count")),
    );
    let button = fx.find("button").unwrap();
    for _ in 0..3 {
        fx.doc().dispatch(button, "click").unwrap();
    }
    assert_eq!(fx.text("b").as_deref(), Some("3"));
    assert_eq!(vm.get("count"), Some(Value::from(3)));
}

#[test]
fn write_through_undefined_parent_fails() {
    let (_fx, vm) = mount("<div></div>", Options::new(json!({})));
    let err = vm.set_path("user.age", 30).unwrap_err();
    assert_eq!(err, BindError::path("user.age", "age"));
    assert!(vm.get("user").is_none());
}

// ═════════════════════════════════════════════════════════════════════════
// Two-way binding
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn two_way_binding_round_trip() {
    let (fx, vm) = mount(
        r#"<form><input v-model="form.name"><p>{{form.name}}</p><i v-text="form.name"></i></form>"#,
        Options::new(json!({"form": {"name": ""}})),
    );
    let input = fx.find("input").unwrap();
    assert_eq!(fx.doc().value(input), "");

    fx.doc().input(input, "Grace").unwrap();
    assert_eq!(vm.get_path("form.name").unwrap(), Value::from("Grace"));
    assert_eq!(fx.text("p").as_deref(), Some("Grace"));
    assert_eq!(fx.text("i").as_deref(), Some("Grace"));

    vm.set_path("form.name", "Ada").unwrap();
    assert_eq!(fx.doc().value(input), "Ada");
}

#[test]
fn model_bound_inputs_share_a_field() {
    let (fx, _vm) = mount(
        r#"<div><input id="a" v-model="q"><input id="b" v-model="q"></div>"#,
        Options::new(json!({"q": "x"})),
    );
    let a = fx.find("#a").unwrap();
    fx.doc().input(a, "typed").unwrap();
    assert_eq!(fx.value("#b").as_deref(), Some("typed"));
}

// ═════════════════════════════════════════════════════════════════════════
// Compile output
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn no_directive_attributes_remain() {
    let (fx, _vm) = mount(
        r#"<div id="app"><a class="c" :href="url" v-bind:title="title" @click="go" v-on:focus="go">x</a><p v-html="raw"></p><input v-model="url"></div>"#,
        Options::new(json!({"url": "/u", "title": "T", "raw": "<em>r</em>"}))
            .with_method("go", |_ctx: &Context, _ev: &DomEvent| Ok(())),
    );
    let markup = fx.markup();
    for needle in ["v-", "@", ":href"] {
        assert!(!markup.contains(needle), "{needle} leaked into {markup}");
    }
    assert_eq!(
        markup,
        r#"<div id="app"><a class="c" href="/u" title="T">x</a><p><em>r</em></p><input></div>"#
    );
}

#[test]
fn attribute_binding_is_reactive() {
    let (fx, vm) = mount(
        r#"<div><img :src="pic.url" alt="p"></div>"#,
        Options::new(json!({"pic": {"url": "a.png"}})),
    );
    assert_eq!(fx.attr("img", "src").as_deref(), Some("a.png"));
    vm.set("pic", json!({"url": "b.png"})).unwrap();
    assert_eq!(fx.attr("img", "src").as_deref(), Some("b.png"));
    vm.set_path("pic.url", "c.png").unwrap();
    assert_eq!(fx.attr("img", "src").as_deref(), Some("c.png"));
    assert_eq!(fx.attr("img", "alt").as_deref(), Some("p"));
}

#[test]
fn raw_content_binding_updates() {
    let (fx, vm) = mount(
        r#"<div><section v-html="body"><p>placeholder</p></section></div>"#,
        Options::new(json!({"body": "<b>1</b>"})),
    );
    let section = fx.find("section").unwrap();
    assert_eq!(fx.doc().inner_markup(section), "<b>1</b>");
    vm.set("body", "<i>2</i>").unwrap();
    assert_eq!(fx.doc().inner_markup(section), "<i>2</i>");
}

#[test]
fn discarded_content_is_not_a_root() {
    let (fx, vm) = mount(
        r#"<div><section v-html="raw"><p id="old">stale</p></section></div>"#,
        Options::new(json!({"raw": "<i>new</i>"})),
    );
    assert_eq!(fx.doc().query("#old"), None);
    vm.set("raw", "<b>newer</b>").unwrap();
    assert_eq!(fx.doc().query("#old"), None);

    let err = Vm::new(fx.doc().clone(), Options::new(json!({})).with_el("#old")).unwrap_err();
    assert_eq!(
        err,
        BindError::RootNotFound {
            selector: "#old".into()
        }
    );
}

#[test]
fn repeated_writes_keep_node_count_flat() {
    let fx = Fixture::parse(r#"<div><p v-text="n"></p><span>{{ n }}</span></div>"#).unwrap();
    let parsed = fx.doc().node_count();
    let vm = Vm::new(fx.doc().clone(), Options::new(json!({"n": 0})).with_el(fx.root())).unwrap();
    // One text node for the v-text render; the staging fragment is gone.
    assert_eq!(fx.doc().node_count(), parsed + 1);

    for i in 0..1000 {
        vm.set("n", i).unwrap();
    }
    assert_eq!(fx.text("p").as_deref(), Some("999"));
    assert_eq!(fx.text("span").as_deref(), Some("999"));
    assert_eq!(fx.doc().node_count(), parsed + 1);
}

#[test]
fn compile_failure_leaves_root_empty() {
    let fx = Fixture::parse(r#"<div><p>{{a}}</p><b v-nope="a"></b></div>"#).unwrap();
    let err = Vm::new(
        fx.doc().clone(),
        Options::new(json!({"a": 1})).with_el(fx.root()),
    )
    .unwrap_err();
    assert_eq!(
        err,
        BindError::UnrecognizedDirective {
            name: "v-nope".into()
        }
    );
    assert!(err.is_compile_error());
    assert_eq!(fx.inner(), "");
}

#[test]
fn bind_target_naming_a_directive_fails_compile() {
    let fx = Fixture::parse(r#"<div><p :v-text="a"></p></div>"#).unwrap();
    let err = Vm::new(fx.doc().clone(), Options::new(json!({"a": "x"})).with_el(fx.root()))
        .unwrap_err();
    assert_eq!(
        err,
        BindError::UnrecognizedDirective {
            name: ":v-text".into()
        }
    );
    assert!(!fx.markup().contains("v-text"));
}

#[test]
fn missing_method_fails_compile() {
    let fx = Fixture::parse(r#"<div><button @click="save">s</button></div>"#).unwrap();
    let err = Vm::new(fx.doc().clone(), Options::new(json!({})).with_el(fx.root())).unwrap_err();
    assert_eq!(
        err,
        BindError::MissingHandler {
            name: "save".into()
        }
    );
}

#[test]
fn custom_syntax_from_toml() {
    let syntax = Syntax::from_toml_str(
        r#"
directive_prefix = "data-"
bind_shorthand = "bind-"
open_delimiter = "${"
close_delimiter = "}"
"#,
    )
    .unwrap();
    let (fx, vm) = mount(
        r#"<div><p data-text="a"></p><a bind-href="a">${a}!</a></div>"#,
        Options::new(json!({"a": "x"})).with_syntax(syntax),
    );
    assert_eq!(fx.inner(), r#"<p>x</p><a href="x">x!</a>"#);
    vm.set("a", "y").unwrap();
    assert_eq!(fx.inner(), r#"<p>y</p><a href="y">y!</a>"#);
}

// ═════════════════════════════════════════════════════════════════════════
// Change detection
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn equal_writes_do_not_rerender() {
    let fx = Fixture::parse(r#"<div><p>{{n}}</p><i>static</i></div>"#).unwrap();
    let tree = CountingTree {
        doc: fx.doc().clone(),
        text_writes: Rc::new(RefCell::new(Vec::new())),
    };
    let vm = Vm::new(
        tree.clone(),
        Options::new(json!({"n": 1})).with_el(fx.root()),
    )
    .unwrap();
    let text = fx.doc().children(fx.find("p").unwrap())[0];
    let initial = tree.writes_to(text);
    assert_eq!(initial, 1);

    vm.set("n", 1).unwrap();
    assert_eq!(tree.writes_to(text), initial);

    for v in [2, 2, 3, 2, 2] {
        vm.set("n", v).unwrap();
    }
    // Distinct transitions: 1->2, 2->3, 3->2.
    assert_eq!(tree.writes_to(text), initial + 3);
    assert_eq!(fx.text("p").as_deref(), Some("2"));
}

#[test]
fn unrelated_bindings_do_not_rerender() {
    let fx = Fixture::parse(r#"<div><p>{{a}}</p><q>{{b}}</q></div>"#).unwrap();
    let tree = CountingTree {
        doc: fx.doc().clone(),
        text_writes: Rc::new(RefCell::new(Vec::new())),
    };
    let vm = Vm::new(
        tree.clone(),
        Options::new(json!({"a": 1, "b": 1})).with_el(fx.root()),
    )
    .unwrap();
    let q_text = fx.doc().children(fx.find("q").unwrap())[0];
    let before = tree.writes_to(q_text);
    vm.set("a", 10).unwrap();
    vm.set("a", 11).unwrap();
    assert_eq!(tree.writes_to(q_text), before);
    assert_eq!(fx.text("p").as_deref(), Some("11"));
}

#[test]
fn replaced_object_is_observed() {
    let (fx, vm) = mount(
        r#"<div><p>{{user.name}}</p></div>"#,
        Options::new(json!({"user": {"name": "a"}})),
    );
    let old = vm.get("user").unwrap();
    vm.set("user", json!({"name": "b"})).unwrap();
    assert_eq!(fx.text("p").as_deref(), Some("b"));

    vm.set_path("user.name", "c").unwrap();
    assert_eq!(fx.text("p").as_deref(), Some("c"));

    // Writes to the detached object no longer matter to the view.
    old.as_object().unwrap().set("name", "zzz").unwrap();
    assert_eq!(fx.text("p").as_deref(), Some("c"));
}

// ═════════════════════════════════════════════════════════════════════════
// Failure isolation
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn failing_watcher_does_not_block_siblings() {
    let (fx, vm) = mount(
        r#"<div><p>{{user.name}}</p><b v-text="user"></b></div>"#,
        Options::new(json!({"user": {"name": "a"}})),
    );
    let err = vm.set("user", Value::Null).unwrap_err();
    assert_eq!(err, BindError::path("user.name", "name"));
    assert_eq!(fx.text("b").as_deref(), Some("null"));
    assert_eq!(fx.text("p").as_deref(), Some("a"));
    assert_eq!(vm.get("user"), Some(Value::Null));
}

#[test]
fn failing_handler_does_not_block_other_listeners() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let (fx, _vm) = mount(
        r#"<div><button @click="boom" v-on:click="count">x</button></div>"#,
        Options::new(json!({}))
            .with_method("boom", |_ctx: &Context, _ev: &DomEvent| {
                Err(BindError::handler("boom"))
            })
            .with_method("count", move |_ctx: &Context, _ev: &DomEvent| {
                seen.set(seen.get() + 1);
                Ok(())
            }),
    );
    let button = fx.find("button").unwrap();
    let err = fx.doc().dispatch(button, "click").unwrap_err();
    assert_eq!(err, BindError::handler("boom"));
    assert_eq!(calls.get(), 1);
}

// ═════════════════════════════════════════════════════════════════════════
// Store edge cases
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn self_referencing_object_terminates() {
    let (_fx, vm) = mount("<div></div>", Options::new(json!({"node": {"v": 1}})));
    let node = vm.get("node").unwrap();
    let obj = node.as_object().unwrap().clone();
    obj.set("me", node.clone()).unwrap();
    assert_eq!(vm.get_path("node.me.me.me.v").unwrap(), Value::from(1));
    assert_eq!(vm.to_json().unwrap_err(), BindError::CyclicValue);
}

#[test]
fn handler_writes_to_new_nested_object() {
    let (fx, vm) = mount(
        r#"<div><button @click="login">in</button><p>{{session.user}}</p></div>"#,
        Options::new(json!({"session": {"user": null}})).with_method(
            "login",
            |ctx: &Context, _ev: &DomEvent| ctx.set("session", json!({"user": "root"})),
        ),
    );
    assert_eq!(fx.text("p").as_deref(), Some("null"));
    fx.doc().dispatch(fx.find("button").unwrap(), "click").unwrap();
    assert_eq!(fx.text("p").as_deref(), Some("root"));
    assert_eq!(vm.to_json().unwrap(), json!({"session": {"user": "root"}}));
    assert_eq!(vm.watcher_count(), 1);
    assert_eq!(vm.stats().map(|s| s.directives), Some(1));
}
