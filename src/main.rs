use runic::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mode = match std::env::args().nth(1).as_deref() {
        Some("normal") => RenderMode::Normal,
        Some("hollusion") => RenderMode::Hollusion,
        Some("anaglyph") | None => RenderMode::Anaglyph,
        Some(other) => {
            log::warn!("unknown mode '{other}', showing anaglyph");
            RenderMode::Anaglyph
        }
    };

    let scene = hollusion_magnitude(
        0.2,
        make_cross(overlay(red(heart()), blue(scale(0.8, circle())))),
    );

    log::info!("presenting in {mode:?} mode");
    run(scene, mode);
}
