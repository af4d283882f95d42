use clap::Parser;
use photo_report_common::{ItemRecord, ProjectRecord, ReportVariant, ValidationError};
use photo_report_rust::{cli, config, error, generate, interactive, logging, render, scanner, session, stamp, store};
use cli::{Cli, Commands, ItemCommand, ProjectCommand, TemplateCommand};
use config::Config;
use error::{ReportError, Result};
use generate::GenerateOptions;
use session::Session;
use stamp::Stamper;
use std::path::{Path, PathBuf};

fn open_session(config: &Config, variant: &ReportVariant, store_path: &Path) -> Session {
    Session::open(
        variant.clone(),
        store::open_store(config.store_backend, store_path),
        config.save_policy,
    )
}

/// 読み込みに失敗したストアは上書きしない
fn open_session_checked(config: &Config, variant: &ReportVariant, store_path: &Path) -> Result<Session> {
    let session = open_session(config, variant, store_path);
    if let Some(err) = session.load_error() {
        return Err(ReportError::StoreCorrupted {
            path: store_path.display().to_string(),
            reason: err.to_string(),
        });
    }
    Ok(session)
}

fn generate_options(config: &Config, variant: &ReportVariant, output: Option<PathBuf>, template: Option<PathBuf>) -> GenerateOptions {
    GenerateOptions {
        output_dir: output.unwrap_or_else(|| config.output_dir()),
        template_path: template.unwrap_or_else(|| config.template_path(variant)),
        burn_disc: false,
        show_progress: true,
        jpeg_quality: config.jpeg_quality,
    }
}

fn print_project(project: &ProjectRecord, variant: &ReportVariant) {
    println!("{}: {}", variant.id_field_label, project.id);
    println!("{}: {}", variant.location_field_label, project.location_or_date);
    for (i, item) in project.items.iter().enumerate() {
        println!("{}", interactive::format_item_line(i, item));
    }
}

/// 1始まりの番号を0始まりへ
fn to_indices(numbers: &[usize]) -> Result<Vec<usize>> {
    numbers
        .iter()
        .map(|&n| {
            n.checked_sub(1)
                .ok_or_else(|| ReportError::Config("項目番号は1以上で指定してください".into()))
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(logging::Verbosity::from_count(cli.verbose));

    let config = Config::load()?;
    let variant = cli.variant.variant();
    let store_path = match cli.store.clone() {
        Some(path) => path,
        None => config.store_path(&variant)?,
    };

    match cli.command {
        Commands::Project { action } => {
            let store = store::open_store(config.store_backend, &store_path);
            match action {
                ProjectCommand::List => {
                    let keys = store.list_keys()?;
                    if keys.is_empty() {
                        println!("保存済みの案件はありません: {}", store.path().display());
                    }
                    for key in keys {
                        println!("{}", key);
                    }
                }
                ProjectCommand::Show { key } => {
                    let project = store.get(&key)?.ok_or(ReportError::ProjectNotFound(key))?;
                    print_project(&project, &variant);
                }
                ProjectCommand::New { id, location } => {
                    let mut session = open_session_checked(&config, &variant, &store_path)?;
                    session.new_project();
                    session.set_info(&id, &location);
                    let key = session.save()?;
                    println!("✔ 案件を作成しました: {}", key);
                }
                ProjectCommand::Remove { key } => {
                    if store.remove(&key)? {
                        println!("✔ 削除しました: {}", key);
                    } else {
                        println!("案件が見つかりません: {}", key);
                    }
                }
            }
        }

        Commands::Item { action } => {
            let mut session = open_session_checked(&config, &variant, &store_path)?;

            match action {
                ItemCommand::Add { key, description, time, image, stamp } => {
                    session.select_project(&key)?;
                    let time = time
                        .or_else(|| scanner::extract_time(&image))
                        .unwrap_or_default();
                    let index = session.add_item(ItemRecord::new(
                        description,
                        time,
                        image.display().to_string(),
                        stamp,
                    ));
                    session.save()?;
                    println!("✔ 項目{}を追加しました: {}", index + 1, key);
                }
                ItemCommand::Remove { key, numbers } => {
                    session.select_project(&key)?;
                    let removed = session.remove_items(&to_indices(&numbers)?)?;
                    session.save()?;
                    println!("✔ {}件削除しました: {}", removed, key);
                }
                ItemCommand::Move { key, from, to } => {
                    session.select_project(&key)?;
                    let indices = to_indices(&[from, to])?;
                    session.move_item(indices[0], indices[1])?;
                    session.save()?;
                    println!("✔ 項目{}を{}番目へ移動しました: {}", from, to, key);
                }
            }
        }

        Commands::Import { folder, id, location, stamp } => {
            println!("📸 写真フォルダを読み込み中...");
            let images = scanner::scan_folder(&folder)?;
            if images.is_empty() {
                return Err(ValidationError::NoItems.into());
            }
            println!("✔ {}枚の写真を検出", images.len());

            let mut session = open_session_checked(&config, &variant, &store_path)?;
            session.new_project();
            session.set_info(&id, &location);
            for item in scanner::items_from_images(&images, stamp) {
                session.add_item(item);
            }
            let key = session.save()?;
            println!("✔ 保存しました: {}", key);
        }

        Commands::Generate { key, burn_disc, output, template } => {
            println!("📄 {} - 報告書生成\n", variant.title);

            let store = store::open_store(config.store_backend, &store_path);
            let project = store.get(&key)?.ok_or(ReportError::ProjectNotFound(key))?;

            let stamper = Stamper::from_config(&config);
            let options = GenerateOptions {
                burn_disc,
                ..generate_options(&config, &variant, output, template)
            };
            let report = generate::generate_report(&project, &variant, &stamper, &options)?;

            println!("✔ {}項目（標記 {}件）", project.items.len(), report.stamped);
            if let Some(archive) = &report.archive {
                println!("✔ 燒光碟: {} ({}枚)", archive.dir.display(), archive.written.len());
                for (index, reason) in &archive.failed {
                    println!("  ✖ 項目{}: {}", index, reason);
                }
            }
            println!("\n✅ 生成しました: {}", report.document_path.display());
        }

        Commands::Stamp { image, time, output } => {
            let stamper = Stamper::from_config(&config);
            let stamped = stamper.stamp(&image, &time, variant.photo_width_cm, variant.photo_height_cm)?;
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, &stamped.bytes)?;
            println!(
                "✔ {}x{} ({}dpi) で標記しました: {}",
                stamped.width,
                stamped.height,
                stamper.settings().dpi,
                output.display()
            );
        }

        Commands::Template { action } => match action {
            TemplateCommand::Init { output } => {
                let path = output.unwrap_or_else(|| config.template_path(&variant));
                if path.exists() {
                    return Err(ReportError::Config(format!(
                        "既にファイルがあります: {}",
                        path.display()
                    )));
                }
                render::write_blank_template(&variant, &path)?;
                println!("✔ テンプレートを作成しました: {}", path.display());
            }
        },

        Commands::Edit { key } => {
            let session = open_session(&config, &variant, &store_path);
            let stamper = Stamper::from_config(&config);
            let options = generate_options(&config, &variant, None, None);
            interactive::run_interactive_edit(session, &stamper, &options, key.as_deref())?;
        }

        Commands::Config { show, set_font, save_policy, dpi } => {
            let mut config = config;
            let changed = set_font.is_some() || save_policy.is_some() || dpi.is_some();

            if let Some(font) = set_font {
                if !font.is_file() {
                    return Err(ReportError::FileNotFound(font.display().to_string()));
                }
                config.font_path = Some(font);
            }
            if let Some(policy) = save_policy {
                config.save_policy = policy;
            }
            if let Some(dpi) = dpi {
                config.dpi = dpi;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("設定:");
                println!(
                    "  フォント: {}",
                    config
                        .font_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "自動".into())
                );
                println!("  dpi: {}", config.dpi);
                println!("  JPEG品質: {}", config.jpeg_quality);
                println!("  保存方針: {}", config.save_policy);
                println!("  保存形式: {}", config.store_backend);
                println!("  案件ストア: {}", store_path.display());
                println!("  テンプレート: {}", config.template_path(&variant).display());
                println!("  出力先: {}", config.output_dir().display());
            }
        }
    }

    Ok(())
}
