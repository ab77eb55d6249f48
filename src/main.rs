use cvs_annotator::AnnotationStore;
use cvs_annotator::config::AppConfig;

/// Native entry point: load the configuration, open the annotation store,
/// and report where the session resumes. The display layer takes over from
/// here.
fn main() {
    let Some(config) = AppConfig::load_from_default_path() else {
        let path = AppConfig::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<config dir>/cvs-annotator/config.json".to_string());
        eprintln!("No configuration found.");
        eprintln!("Create {path} with the frames directory, for example:");
        eprintln!("{{\n  \"version\": 1,\n  \"frames_dir\": \"/data/frames\"\n}}");
        std::process::exit(1);
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match AnnotationStore::open(&config.frames_dir, &config.annotation_file) {
        Ok(store) => {
            let (position, total) = store.progress();
            let (video_id, frame_id) = store.current_id();
            log::info!(
                "annotation table ready: {} frames, cursor at {}/{} ({} frame {})",
                store.len(),
                position,
                total,
                video_id,
                frame_id
            );
        }
        Err(e) => {
            eprintln!("Failed to open annotation store: {e}");
            std::process::exit(1);
        }
    }
}
