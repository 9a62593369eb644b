//! Demo showing basic geoscene-rs usage.
//!
//! Builds a small survey: a closed pit outline, a drill-hole trace and a
//! cloud of assay samples, then edits them and picks with a few snap modes.
//! Run with `RUST_LOG=debug` to see buffer and label activity.

use geoscene::*;

fn main() -> Result<()> {
    init_logging();
    let mut scene = Scene::default();

    // Pit outline: a ring of points around a local survey origin
    let n = 24;
    let ring: Vec<DVec3> = (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * f64::from(i) / f64::from(n);
            DVec3::new(
                512_000.0 + 40.0 * angle.cos(),
                7_104_000.0 + 25.0 * angle.sin(),
                310.0,
            )
        })
        .collect();
    let outline = scene.register_polyline("pit outline")?;
    outline.add_points(ring, Some(ColorInput::Uniform([230, 160, 40])))?;
    outline.close();
    log::info!(
        "outline: {} points, length {:.1} m, area {:.1} m2",
        outline.user_point_count(),
        outline.length(),
        outline.area()
    );

    // Drill hole: collar then downhole interval boundaries
    let collar = DVec3::new(512_010.0, 7_104_005.0, 310.0);
    let depths = [0.0, 12.5, 30.0, 47.0, 80.0];
    let trace = scene.register_trace("DH-042")?;
    trace.add_points(
        depths
            .iter()
            .map(|d| collar + DVec3::new(0.2, 0.1, -1.0).normalize() * *d)
            .collect::<Vec<_>>(),
        None,
    )?;
    trace.add_attribute("lithology", AttributeKind::Interned)?;
    for (i, rock) in ["overburden", "granite", "schist", "granite"].iter().enumerate() {
        trace.set_attribute("lithology", i, *rock)?;
    }
    // Split the second interval at 20 m
    trace.insert_points(2, collar + DVec3::new(0.2, 0.1, -1.0).normalize() * 20.0, None)?;

    // Assay samples drawn with a shared marker
    let samples = scene.register_point_cloud("assays", Some("diamond"))?;
    samples.add_points(
        (0..50)
            .map(|i| collar + DVec3::new(0.0, 0.0, -1.6 * f64::from(i)))
            .collect::<Vec<_>>(),
        None,
    )?;
    samples.hide_points(&[0, 1, 2])?;

    // Pick straight down onto the outline's eastern edge
    let ray = Ray::new(DVec3::new(512_040.0, 7_104_000.0, 400.0), DVec3::NEG_Z);
    for mode in [SnapMode::None, SnapMode::Points, SnapMode::Bisector] {
        let params = scene.default_params().with_snap_mode(mode);
        match scene.pick(&ray, &params) {
            Some(hit) => log::info!(
                "{mode:?}: {} {:?} #{} at {:.2?} (child {:?})",
                hit.object,
                hit.kind,
                hit.index,
                hit.point,
                hit.child
            ),
            None => log::info!("{mode:?}: no hit"),
        }
    }

    if let Some(bounds) = scene.bounding_box() {
        log::info!("scene extent {:.1?}", bounds.size());
    }

    scene.remove("assays")?;
    Ok(())
}
