//! Records a small frame against the headless backend, flushes it and prints the resulting schedule.
//!
//! The frame renders a multisampled, mip mapped offscreen surface from an uploaded atlas, then composites it into the main
//! target and reads the result back. Reading the offscreen surface needs an MSAA resolve and mip map regeneration, which the
//! graph inserts on its own.

use std::sync::Arc;

use anyhow::Result;
use grit::{
    ProviderConfig, ResourceProvider,
    headless::HeadlessFactory,
    resources::{Filter, ResourceKind, SamplerState, WrapMode},
};
use grit_fp::{
    Color, FpId, FpTree, Matrix,
    effects::{ConstColor, InputMode, PremulEffect, Swizzle, SwizzleEffect, TextureEffect, run_in_series},
};
use grit_rtg::{
    Caps, IRect, ProxyDesc, ProxyKey, RenderTaskGraph, TaskKey,
    tasks::{CopyTask, Draw, DrawTask, TransferTask},
};

///Records a draw task into `target` that shades with the processor tree at `fp`, and adds a dependency for each texture the
/// tree samples.
fn record_draw(graph: &mut RenderTaskGraph, tree: &FpTree, name: &str, target: ProxyKey, fp: FpId) -> TaskKey {
    let samplers = tree
        .iter(fp)
        .filter_map(|id| tree.node(id))
        .flat_map(|node| node.effect().samplers().iter().map(|s| s.state))
        .collect();
    let draw = Draw {
        program_key: tree.processor_key(fp),
        samplers,
    };

    let bounds = graph
        .proxy(target)
        .map(|p| p.bounds())
        .unwrap_or(IRect::EMPTY);
    let task = graph.add_task(Box::new(
        DrawTask::new(name, target, bounds).with_clear().with_draw(draw),
    ));
    graph.add_target(task, target);

    tree.visit_proxies(fp, |proxy, mipmapped| {
        graph.add_surface_dependency(task, proxy, mipmapped);
    });
    task
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Trace)
        .init()?;

    let factory = Arc::new(HeadlessFactory::new());
    let mut provider = ResourceProvider::new(factory.clone(), ProviderConfig::default())?;
    let mut graph = RenderTaskGraph::new(Caps::default());
    let mut tree = FpTree::new();

    let atlas = graph.create_proxy(ProxyDesc::texture("atlas", 512, 512).deferred());
    let offscreen = graph.create_proxy(
        ProxyDesc::render_target("offscreen", 256, 256)
            .with_samples(4)
            .with_mipmaps(),
    );
    let main_target = graph.create_proxy(ProxyDesc::render_target("main", 1024, 768));
    let readback = graph.create_proxy(ProxyDesc::render_target("readback", 1024, 768));

    //Offscreen pass: alpha of the atlas.
    let atlas_fp = TextureEffect::make(
        &mut tree,
        atlas,
        SamplerState::new(Filter::Linear, WrapMode::Clamp),
        Matrix::IDENTITY,
    );
    let offscreen_fp = SwizzleEffect::make(&mut tree, atlas_fp, Swizzle::AAAA);
    record_draw(&mut graph, &tree, "offscreen", offscreen, offscreen_fp);

    //Composite: mip mapped offscreen surface, premultiplied and tinted.
    let composite_tex = TextureEffect::make(
        &mut tree,
        offscreen,
        SamplerState::new(Filter::Mipmap, WrapMode::Repeat),
        Matrix::scale(4.0, 3.0),
    );
    let premul = PremulEffect::make(&mut tree, composite_tex);
    let tint = ConstColor::make(&mut tree, Color::new(1.0, 0.8, 0.6, 1.0), InputMode::ModulateRgba);
    let composite_fp = run_in_series(&mut tree, &[premul, tint]).unwrap_or(premul);
    record_draw(&mut graph, &tree, "composite", main_target, composite_fp);

    println!("Processor tree:\n{}", tree.dump(composite_fp));

    let copy = graph.add_task(Box::new(CopyTask::new(
        main_target,
        readback,
        IRect::from_wh(1024, 768),
    )));
    graph.add_surface_dependency(copy, main_target, grit_rtg::Mipmapped::No);
    graph.add_target(copy, readback);

    let transfer = graph.add_task(Box::new(TransferTask::new(readback)));
    graph.add_surface_dependency(transfer, readback, grit_rtg::Mipmapped::No);

    graph.instantiate_all();
    assert!(graph.validate(), "Recorded graph is invalid");
    println!("{}", graph);

    let report = graph.flush(&mut provider)?;
    println!("Order:    {:?}", report.order);
    println!("Executed: {:?}", report.executed);
    println!("Skipped:  {:?}", report.skipped);
    println!("Uploads:  {}", report.uploads.len());
    for (task, err) in report.failed.iter() {
        println!("Task {} failed: {}", task, err);
    }

    let (hits, misses) = provider.pipeline_state_stats();
    println!("Pipeline states: {} hits, {} misses", hits, misses);
    println!(
        "Render pass sets: {}, pipelines: {}, samplers: {}",
        provider.render_pass_set_count(),
        factory.live(ResourceKind::Pipeline),
        factory.live(ResourceKind::Sampler),
    );

    drop(graph);
    provider.destroy_resources();
    println!("Live backend objects after teardown: {}", factory.live_total());

    Ok(())
}
