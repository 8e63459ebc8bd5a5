use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(study_root: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    let base = study_root.or(home_dir)?;
    Some(base.join(".stager/.env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("STAGER_STUDY_ROOT").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}
