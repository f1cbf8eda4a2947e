use chrono::TimeZone;
use chrono_tz::Europe::Berlin;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use solpaper::geo::{FixedSolarTimes, Location};
use solpaper::pack::{self, list_packs, load_pack, validate_pack};
use solpaper::schedule::resolve;

fn write_pack(config_dir: &Path, name: &str, manifest: &str, images: &[&str]) {
    let dir = pack::packs_dir(config_dir).join(name);
    fs::create_dir_all(dir.join("images")).unwrap();
    fs::write(dir.join("schedule.toml"), manifest).unwrap();
    for image in images {
        image::RgbImage::new(16, 9)
            .save_with_format(dir.join("images").join(image), image::ImageFormat::Png)
            .unwrap();
    }
}

const COASTAL: &str = r#"
[meta]
name = "Coastal"

[[segments]]
start = "dusk"
image = "night.jpg"
label = "night"

[[segments]]
start = "sunrise-15"
image = "morning.jpg"

[[segments]]
start = "11:00"
image = "day.jpg"
"#;

#[test]
fn test_loaded_pack_drives_the_resolver() {
    let config = tempdir().unwrap();
    write_pack(config.path(), "coastal", COASTAL, &["night.jpg", "morning.jpg", "day.jpg"]);

    let pack = load_pack(&pack::pack_dir(config.path(), "coastal")).unwrap();
    assert_eq!(pack.name(), "Coastal");
    assert_eq!(pack.model.len(), 3);

    let location = Location::timezone_only(Berlin);
    let now = Berlin.with_ymd_and_hms(2024, 7, 1, 2, 0, 0).unwrap();
    let result = resolve(&pack.model, &location, &now, &FixedSolarTimes).unwrap();

    assert_eq!(result.active_image, pack.dir.join("images/night.jpg"));
    assert_eq!(result.active_since, Berlin.with_ymd_and_hms(2024, 6, 30, 19, 30, 0).unwrap());
    assert_eq!(result.next_change_at, Berlin.with_ymd_and_hms(2024, 7, 1, 6, 15, 0).unwrap());
}

#[test]
fn test_list_packs_reports_broken_packs_in_name_order() {
    let config = tempdir().unwrap();
    write_pack(config.path(), "zen", COASTAL, &[]);
    write_pack(config.path(), "broken", "[[segments]]\nstart = \"teatime\"\nimage = \"a.jpg\"\n", &[]);
    write_pack(config.path(), "coastal", COASTAL, &["night.jpg"]);
    fs::create_dir_all(pack::packs_dir(config.path()).join("not-a-pack")).unwrap();

    let packs = list_packs(config.path()).unwrap();
    let names: Vec<&str> = packs.iter().map(|p| p.dir_name.as_str()).collect();
    assert_eq!(names, vec!["broken", "coastal", "zen"]);

    let broken = packs[0].pack.as_ref().unwrap_err();
    assert!(broken.contains("teatime"), "{broken}");
    assert!(packs[1].pack.is_ok());
}

#[test]
fn test_list_packs_without_packs_directory() {
    let config = tempdir().unwrap();
    assert!(list_packs(config.path()).unwrap().is_empty());
}

#[test]
fn test_validation_collects_every_problem() {
    let config = tempdir().unwrap();
    write_pack(
        config.path(),
        "messy",
        "[[segments]]\nstart = \"25:00\"\nimage = \"a.jpg\"\n\n\
         [[segments]]\nstart = \"sunset\"\nimage = \"missing.jpg\"\n\n\
         [[segments]]\nstart = \"sunset\"\nimage = \"notes.txt\"\n",
        &["a.jpg", "notes.txt"],
    );
    let dir = pack::pack_dir(config.path(), "messy");
    fs::write(dir.join("images/corrupt.png"), b"\x89PNG").unwrap();
    fs::write(
        dir.join("schedule.toml"),
        format!(
            "{}\n[[segments]]\nstart = \"noon\"\nimage = \"corrupt.png\"\n",
            fs::read_to_string(dir.join("schedule.toml")).unwrap()
        ),
    )
    .unwrap();

    let report = validate_pack(&dir);
    assert!(!report.passed());
    assert!(report.has_check("anchor_invalid"));
    assert!(report.has_check("image_missing"));
    assert!(report.has_check("image_invalid"));
    assert!(report.has_check("image_size"));
    assert!(report.has_check("duplicate_anchor"));
    assert!(report.has_check("meta_name"));
    assert_eq!(report.errors().count(), 3);
}

#[test]
fn test_days_pack_follows_the_local_weekday() {
    let config = tempdir().unwrap();
    write_pack(
        config.path(),
        "week",
        "[meta]\nname = \"Week\"\ntype = \"days\"\n\n[days]\n\
         monday = \"work.png\"\nsaturday = { images = [\"late.png\", \"early.png\"] }\n",
        &["work.png", "late.png", "early.png"],
    );

    let pack = load_pack(&pack::pack_dir(config.path(), "week")).unwrap();
    let location = Location::timezone_only(Berlin);

    // Saturday 2024-07-06, second half of the day
    let now = Berlin.with_ymd_and_hms(2024, 7, 6, 15, 0, 0).unwrap();
    let result = resolve(&pack.model, &location, &now, &FixedSolarTimes).unwrap();
    assert_eq!(result.active_image, pack.dir.join("images/early.png"));
    assert_eq!(result.active_since, Berlin.with_ymd_and_hms(2024, 7, 6, 12, 0, 0).unwrap());
    // Sunday is not listed and shows Monday's image
    assert_eq!(result.next_change_at, Berlin.with_ymd_and_hms(2024, 7, 7, 0, 0, 0).unwrap());
    assert_eq!(pack.model.image(result.next_index), Some(pack.dir.join("images/work.png").as_path()));

    let report = validate_pack(&pack.dir);
    assert!(report.passed(), "{:?}", report.issues());
    assert!(report.has_check("days_missing"));
}

#[test]
fn test_load_pack_fails_where_validation_fails() {
    let config = tempdir().unwrap();
    write_pack(config.path(), "empty", "[meta]\nname = \"Empty\"\n", &[]);

    let dir = pack::pack_dir(config.path(), "empty");
    let err = load_pack(&dir).unwrap_err();
    assert!(format!("{err:#}").contains("no segments"), "{err:#}");
    assert!(validate_pack(&dir).has_check("no_segments"));
}
