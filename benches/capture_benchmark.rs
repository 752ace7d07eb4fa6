use criterion::{Criterion, black_box, criterion_group, criterion_main};
use shotlist::surface::{
    ClipRect, Locator, MockJournal, MockSurface, ShotRegion, UiSurface, ViewportSize, demo_app,
};

fn benchmark_render_and_encode(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let mut surface = MockSurface::new(demo_app(), MockJournal::new());
    runtime.block_on(async {
        surface.set_viewport(ViewportSize::FullHd).await.unwrap();
        let id = surface
            .query(&Locator::css("button").containing("Get Started"))
            .await
            .unwrap()
            .unwrap();
        surface.click(id).await.unwrap();
    });

    c.bench_function("viewport_capture_fullhd", |b| {
        b.iter(|| {
            let png = runtime
                .block_on(surface.screenshot(black_box(ShotRegion::Viewport)))
                .unwrap();
            assert!(!png.is_empty());
        })
    });

    c.bench_function("element_crop_capture", |b| {
        let clip = ClipRect::new(20.0, 70.0, 360.0, 84.0);
        b.iter(|| {
            let png = runtime
                .block_on(surface.screenshot(black_box(ShotRegion::Clip(clip))))
                .unwrap();
            assert!(!png.is_empty());
        })
    });
}

criterion_group!(benches, benchmark_render_and_encode);
criterion_main!(benches);
