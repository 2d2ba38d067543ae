//! Example: click counter driven frame by frame
//!
//! Run with `RUST_LOG=fos_fiber=debug` to watch passes and commits.

use fos_fiber::{create_element, Child, Component, Element, Event, EventHandler, Hooks, Props, Reconciler, ReconcilerConfig};
use fos_fiber_dom::{FrameBudget, IdleScheduler, MemoryDom};
use tracing_subscriber::EnvFilter;

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

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut dom = MemoryDom::new();
    // Nothing inspects the log here
    dom.set_mutation_limit(0);
    let container = dom.create_container("main");
    let mut reconciler = Reconciler::new(dom, ReconcilerConfig::default());
    let mut scheduler = IdleScheduler::new(FrameBudget::for_60fps());

    reconciler.render(Element::component(counter(), Props::new()), container);
    let frames = scheduler.run_until_idle(&mut reconciler, 100)?;
    println!("mounted in {} frame(s): {}", frames, reconciler.host().to_html(container));

    let h1 = reconciler
        .host()
        .find_by_tag(container, "h1")
        .ok_or_else(|| anyhow::anyhow!("counter did not render a heading"))?;

    for _ in 0..3 {
        reconciler.host().dispatch_event(h1, &Event::new("click"));
        scheduler.run_until_idle(&mut reconciler, 100)?;
        println!("{}", reconciler.host().text_content(container));
    }

    let stats = reconciler.stats();
    println!(
        "{} passes, {} commits, {} units over {} frames",
        stats.passes,
        stats.commits,
        stats.units_performed,
        scheduler.stats().frame_count
    );
    Ok(())
}
