//! End-to-end tests for fos-fiber against the in-memory DOM
//!
//! Each scenario renders through a `Reconciler<MemoryDom>` and checks the
//! resulting document and the mutations the commit performed.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fos_fiber::{
    create_element, Child, Cleanup, Component, Element, Event, EventHandler, Hooks, Props,
    ReconcileError, Reconciler, ReconcilerConfig, WorkStatus,
};
use fos_fiber_dom::{FrameBudget, IdleScheduler, MemoryDom, Mutation, NodeId};

fn mount() -> (Reconciler<MemoryDom>, NodeId) {
    let mut dom = MemoryDom::new();
    let container = dom.create_container("main");
    (Reconciler::new(dom, ReconcilerConfig::default()), container)
}

fn no_children() -> Vec<Child> {
    Vec::new()
}

fn counter() -> Component {
    Component::new(|_: &Props, hooks: &mut Hooks<'_>| {
        let (count, set_count) = hooks.use_state(0i64);
        let on_click = EventHandler::new(move |_| set_count.set(|c| c + 1));
        create_element(
            "h1",
            Props::new().with("onClick", on_click),
            [Child::from(format!("Click me: {count}"))],
        )
    })
}

fn html(r: &Reconciler<MemoryDom>, container: NodeId) -> String {
    r.host().to_html(container)
}

// ============================================================================
// Click counter
// ============================================================================

#[test]
fn test_click_counter() {
    let (mut r, container) = mount();
    r.render(Element::component(counter(), Props::new()), container);
    r.flush().unwrap();
    assert_eq!(html(&r, container), "<main><h1>Click me: 0</h1></main>");

    let h1 = r.host().find_by_tag(container, "h1").unwrap();
    for _ in 0..3 {
        assert_eq!(r.host().dispatch_event(h1, &Event::new("click")), 1);
        r.flush().unwrap();
    }

    assert_eq!(r.host().text_content(container), "Click me: 3");
    // One initial pass plus exactly one per click
    assert_eq!(r.stats().passes, 4);
    // The header node is patched in place, never recreated
    assert_eq!(r.host().find_by_tag(container, "h1"), Some(h1));
}

#[test]
fn test_clicks_before_flush_coalesce_into_one_pass() {
    let (mut r, container) = mount();
    r.render(Element::component(counter(), Props::new()), container);
    r.flush().unwrap();

    let h1 = r.host().find_by_tag(container, "h1").unwrap();
    for _ in 0..3 {
        r.host().dispatch_event(h1, &Event::new("click"));
    }
    r.flush().unwrap();

    assert_eq!(r.host().text_content(container), "Click me: 3");
    assert_eq!(r.stats().passes, 2);
}

#[test]
fn test_updates_in_one_handler_fold_left() {
    let app = Component::new(|_: &Props, hooks: &mut Hooks<'_>| {
        let (value, set_value) = hooks.use_state(1i64);
        let on_click = EventHandler::new(move |_| {
            set_value.set(|v| v + 1);
            set_value.set(|v| v * 10);
            set_value.set(|v| v - 3);
        });
        create_element(
            "button",
            Props::new().with("onClick", on_click),
            [Child::from(value)],
        )
    });

    let (mut r, container) = mount();
    r.render(Element::component(app, Props::new()), container);
    r.flush().unwrap();

    let button = r.host().find_by_tag(container, "button").unwrap();
    r.host().dispatch_event(button, &Event::new("click"));
    r.flush().unwrap();

    assert_eq!(r.host().text_content(button), "17");
}

// ============================================================================
// Diffing
// ============================================================================

#[test]
fn test_identical_rerender_performs_no_mutations() {
    let view = || {
        create_element(
            "div",
            Props::new().with("id", "app").with("tabindex", 1i64),
            [
                Child::from(create_element("p", Props::new(), [Child::from("hello")])),
                Child::from("world"),
            ],
        )
    };

    let (mut r, container) = mount();
    r.render(view(), container);
    r.flush().unwrap();
    assert!(!r.host_mut().take_mutations().is_empty());

    r.render(view(), container);
    r.flush().unwrap();
    assert!(r.host().mutations().is_empty());
    assert_eq!(
        html(&r, container),
        "<main><div id=\"app\" tabindex=\"1\"><p>hello</p>world</div></main>"
    );
}

#[test]
fn test_tree_shape_change_removes_before_inserting() {
    let view = |tag: &str, text: &str| {
        create_element(
            "div",
            Props::new(),
            [Child::from(create_element(tag, Props::new(), [Child::from(text)]))],
        )
    };

    let (mut r, container) = mount();
    r.render(view("p", "A"), container);
    r.flush().unwrap();
    let div = r.host().find_by_tag(container, "div").unwrap();
    let p = r.host().find_by_tag(container, "p").unwrap();
    r.host_mut().take_mutations();

    r.render(view("span", "B"), container);
    r.flush().unwrap();

    assert_eq!(html(&r, container), "<main><div><span>B</span></div></main>");
    assert_eq!(r.host().find_by_tag(container, "div"), Some(div));

    let mutations = r.host_mut().take_mutations();
    let removed = mutations
        .iter()
        .position(|m| *m == Mutation::Remove { parent: div, child: p })
        .unwrap();
    let first_structural = mutations.iter().position(Mutation::is_structural).unwrap();
    assert_eq!(removed, first_structural);
    assert!(mutations[removed + 1..].iter().all(|m| !matches!(m, Mutation::Remove { .. })));
}

#[test]
fn test_shrinking_children() {
    let list = |items: &[&str]| {
        let children: Vec<Child> = items
            .iter()
            .map(|item| Child::from(create_element("li", Props::new(), [Child::from(*item)])))
            .collect();
        create_element("ul", Props::new(), children)
    };

    let (mut r, container) = mount();
    r.render(list(&["a", "b", "c"]), container);
    r.flush().unwrap();
    r.host_mut().take_mutations();

    r.render(list(&["a"]), container);
    r.flush().unwrap();

    assert_eq!(html(&r, container), "<main><ul><li>a</li></ul></main>");
    let mutations = r.host_mut().take_mutations();
    assert_eq!(mutations.len(), 2);
    assert!(mutations.iter().all(|m| matches!(m, Mutation::Remove { .. })));
    assert_eq!(r.last_commit().unwrap().deletions, 2);
}

#[test]
fn test_prop_changes_patch_in_place() {
    let stable = EventHandler::new(|_| {});
    let view = |title: Option<&str>, class: &str| {
        let mut props = Props::new().with("class", class).with("onClick", stable.clone());
        if let Some(title) = title {
            props.insert("title", title);
        }
        create_element("div", props, no_children())
    };

    let (mut r, container) = mount();
    r.render(view(Some("t"), "a"), container);
    r.flush().unwrap();
    let div = r.host().find_by_tag(container, "div").unwrap();
    r.host_mut().take_mutations();

    r.render(view(None, "b"), container);
    r.flush().unwrap();

    let mutations = r.host_mut().take_mutations();
    assert_eq!(
        mutations,
        vec![
            Mutation::ClearProperty { node: div, name: "title".into() },
            Mutation::SetProperty { node: div, name: "class".into(), value: "b".into() },
        ]
    );
    assert_eq!(r.host().get_attribute(div, "title"), None);
    assert_eq!(r.host().get(div).unwrap().listener_count("click"), 1);
}

// ============================================================================
// Effects
// ============================================================================

type Log = Rc<RefCell<Vec<String>>>;

fn watcher(log: &Log) -> Component {
    let log = Rc::clone(log);
    Component::new(move |props: &Props, hooks: &mut Hooks<'_>| {
        let dep = props.get("dep").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let on_run = Rc::clone(&log);
        let on_cleanup = Rc::clone(&log);
        let label = dep.clone();
        hooks.use_effect(dep.clone(), move || {
            on_run.borrow_mut().push(format!("run {label}"));
            Some(Box::new(move || on_cleanup.borrow_mut().push(format!("cleanup {label}"))) as Cleanup)
        });
        create_element("p", Props::new(), [Child::from(dep)])
    })
}

#[test]
fn test_effect_follows_dependencies() {
    let log: Log = Rc::default();
    let component = watcher(&log);
    let (mut r, container) = mount();
    let render = |r: &mut Reconciler<MemoryDom>, dep: &str| {
        r.render(Element::component(component.clone(), Props::new().with("dep", dep)), container);
        r.flush().unwrap();
    };

    render(&mut r, "x");
    assert_eq!(*log.borrow(), vec!["run x"]);

    render(&mut r, "x");
    assert_eq!(*log.borrow(), vec!["run x"]);
    assert_eq!(r.last_commit().unwrap().effects_run, 0);

    render(&mut r, "y");
    assert_eq!(*log.borrow(), vec!["run x", "cleanup x", "run y"]);
    assert_eq!(r.host().text_content(container), "y");
}

#[test]
fn test_unmount_runs_pending_cleanup() {
    let log: Log = Rc::default();
    let (mut r, container) = mount();
    r.render(Element::component(watcher(&log), Props::new().with("dep", "x")), container);
    r.flush().unwrap();

    r.render(create_element("footer", Props::new(), no_children()), container);
    r.flush().unwrap();

    assert_eq!(*log.borrow(), vec!["run x", "cleanup x"]);
    assert_eq!(html(&r, container), "<main><footer></footer></main>");
}

#[test]
fn test_effect_setting_state_settles() {
    let app = Component::new(|_: &Props, hooks: &mut Hooks<'_>| {
        let (loaded, set_loaded) = hooks.use_state(false);
        hooks.use_effect((), move || {
            set_loaded.set_value(true);
            None
        });
        create_element("p", Props::new(), [Child::from(if loaded { "ready" } else { "loading" })])
    });

    let (mut r, container) = mount();
    r.render(Element::component(app, Props::new()), container);
    r.flush().unwrap();

    assert_eq!(r.host().text_content(container), "ready");
    assert_eq!(r.stats().passes, 2);
}

#[test]
fn test_effect_loop_is_reported() {
    let app = Component::new(|_: &Props, hooks: &mut Hooks<'_>| {
        let (n, set_n) = hooks.use_state(0i64);
        hooks.use_effect_always(move || {
            set_n.set(|n| n + 1);
            None
        });
        create_element("p", Props::new(), [Child::from(n)])
    });

    let mut dom = MemoryDom::new();
    let container = dom.create_container("main");
    let mut r = Reconciler::new(dom, ReconcilerConfig::default().with_max_flush_passes(10));
    r.render(Element::component(app, Props::new()), container);

    let err = r.flush().unwrap_err();
    assert!(matches!(err, ReconcileError::UpdateLoop { passes: 10 }));
}

// ============================================================================
// Scheduling
// ============================================================================

fn nested_view() -> Element {
    let row = Component::new(|props: &Props, _: &mut Hooks<'_>| {
        let label = props.get("label").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        create_element("li", Props::new().with("class", "row"), [Child::from(label)])
    });
    let rows: Vec<Child> = (0..5)
        .map(|i| Child::from(Element::component(row.clone(), Props::new().with("label", format!("row {i}")))))
        .collect();
    create_element(
        "section",
        Props::new(),
        [
            Child::from(create_element("h2", Props::new(), [Child::from("rows")])),
            Child::from(create_element("ul", Props::new(), rows)),
        ],
    )
}

fn starved() -> FrameBudget {
    FrameBudget {
        frame: Duration::from_millis(16),
        idle: Duration::ZERO,
    }
}

#[test]
fn test_sliced_walk_matches_synchronous_result() {
    let (mut eager, container) = mount();
    eager.render(nested_view(), container);
    eager.flush().unwrap();
    let expected_html = html(&eager, container);
    let expected_mutations = eager.host_mut().take_mutations();

    let (mut sliced, container) = mount();
    sliced.render(nested_view(), container);
    let mut scheduler = IdleScheduler::new(starved());
    let frames = scheduler.run_until_idle(&mut sliced, 1000).unwrap();

    // One unit per frame: nothing is attached until the final frame commits
    assert_eq!(frames as u64, eager.stats().units_performed);
    assert_eq!(scheduler.stats().yielded_frames, frames as u64 - 1);
    assert_eq!(html(&sliced, container), expected_html);
    assert_eq!(sliced.host_mut().take_mutations(), expected_mutations);
    assert_eq!(sliced.stats().commits, 1);
}

#[test]
fn test_host_untouched_until_commit() {
    let (mut r, container) = mount();
    r.render(nested_view(), container);
    let mut scheduler = IdleScheduler::new(starved());

    assert_eq!(scheduler.run_frame(&mut r).unwrap(), WorkStatus::Pending);
    assert_eq!(scheduler.run_frame(&mut r).unwrap(), WorkStatus::Pending);
    assert!(r.host().children(container).is_empty());
    assert!(r.current_root().is_none());

    scheduler.run_until_idle(&mut r, 1000).unwrap();
    assert_eq!(r.host().children(container).len(), 1);
}

#[test]
fn test_render_during_walk_waits_for_commit() {
    let (mut r, container) = mount();
    let mut scheduler = IdleScheduler::new(starved());

    r.render(nested_view(), container);
    scheduler.run_frame(&mut r).unwrap();
    r.render(create_element("aside", Props::new(), [Child::from("later")]), container);
    scheduler.run_until_idle(&mut r, 1000).unwrap();

    assert_eq!(r.stats().commits, 2);
    assert_eq!(html(&r, container), "<main><aside>later</aside></main>");
}

#[test]
fn test_generous_budget_finishes_in_one_frame() {
    let (mut r, container) = mount();
    r.render(nested_view(), container);
    let budget = FrameBudget {
        frame: Duration::from_secs(10),
        idle: Duration::from_secs(10),
    };
    let mut scheduler = IdleScheduler::new(budget);

    assert_eq!(scheduler.run_frame(&mut r).unwrap(), WorkStatus::Idle);
    assert_eq!(r.stats().yields, 0);
    assert!(html(&r, container).contains("<li class=\"row\">row 4</li>"));
}
