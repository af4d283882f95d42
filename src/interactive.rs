//! 対話式の案件編集
//!
//! 1行コマンドで案件と写真項目を編集する。番号は1始まりで入力し、
//! セッションには0始まりで渡す。

use crate::error::{ReportError, Result};
use crate::generate::GenerateOptions;
use crate::scanner::extract_time;
use crate::session::Session;
use crate::stamp::Stamper;
use dialoguer::{Confirm, Input};
use photo_report_common::{ItemRecord, ProjectRecord};
use std::path::Path;

const HELP: &str = "\
操作:
  p              保存済み案件の一覧
  o <キー>       案件を開く
  n              新規案件
  i              案件情報（編號/地址など）を入力
  l              写真項目の一覧
  a              写真項目を追加
  u <番号>       写真項目を編集
  d <番号>...    写真項目を削除（複数可）
  m <元> <先>    写真項目を移動
  w              保存
  x <キー>       保存済み案件を削除
  g [b]          報告書を生成（b: 燒光碟も行う）
  q              終了";

/// 対話アクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Projects,
    Open(String),
    New,
    Info,
    List,
    Add,
    /// 0始まり
    Update(usize),
    /// 0始まり
    Remove(Vec<usize>),
    /// 0始まり
    Move(usize, usize),
    Save,
    RemoveProject(String),
    Generate { burn_disc: bool },
    Help,
    Quit,
}

/// 1始まりの番号を0始まりに変換
fn parse_index(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("番号が不正です: {}", s)),
    }
}

/// 入力行をアクションに変換
pub fn parse_edit_command(line: &str) -> std::result::Result<EditAction, String> {
    let trimmed = line.trim();
    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match (command, args.as_slice()) {
        ("p", []) => Ok(EditAction::Projects),
        ("o", [_, ..]) => Ok(EditAction::Open(rest.to_string())),
        ("n", []) => Ok(EditAction::New),
        ("i", []) => Ok(EditAction::Info),
        ("l", []) | ("", []) => Ok(EditAction::List),
        ("a", []) => Ok(EditAction::Add),
        ("u", [n]) => Ok(EditAction::Update(parse_index(n)?)),
        ("d", [_, ..]) => {
            let indices = args
                .iter()
                .map(|n| parse_index(n))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(EditAction::Remove(indices))
        }
        ("m", [from, to]) => Ok(EditAction::Move(parse_index(from)?, parse_index(to)?)),
        ("w", []) => Ok(EditAction::Save),
        ("x", [_, ..]) => Ok(EditAction::RemoveProject(rest.to_string())),
        ("g", []) => Ok(EditAction::Generate { burn_disc: false }),
        ("g", ["b"]) => Ok(EditAction::Generate { burn_disc: true }),
        ("h" | "?", []) => Ok(EditAction::Help),
        ("q" | "Q", []) => Ok(EditAction::Quit),
        _ => Err(format!("不明な操作です: {}（h でヘルプ）", trimmed)),
    }
}

/// 写真項目の1行表示
pub fn format_item_line(index: usize, item: &ItemRecord) -> String {
    format!(
        "{:>3}. {} | {} | {}{}",
        index + 1,
        item.description,
        item.time,
        item.image_path,
        if item.stamp_time { " [標記]" } else { "" }
    )
}

fn prompt_text(prompt: &str, initial: &str) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if !initial.is_empty() {
        input = input.with_initial_text(initial);
    }
    let value = input
        .interact_text()
        .map_err(|e| ReportError::Interactive(e.to_string()))?;
    Ok(value.trim().to_string())
}

fn prompt_confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| ReportError::Interactive(e.to_string()))
}

/// 写真項目の入力（時間が空ならEXIFの撮影日時を候補にする）
fn prompt_item(current: &ItemRecord) -> Result<ItemRecord> {
    let image_path = prompt_text("圖片路徑", &current.image_path)?;
    let time_hint = if current.time.is_empty() {
        extract_time(Path::new(&image_path)).unwrap_or_default()
    } else {
        current.time.clone()
    };
    let description = prompt_text("施工說明", &current.description)?;
    let time = prompt_text("時間", &time_hint)?;
    let stamp_time = prompt_confirm("時間を標記しますか", current.stamp_time)?;
    Ok(ItemRecord::new(description, time, image_path, stamp_time))
}

fn print_project(project: Option<&ProjectRecord>, session: &Session) {
    let variant = session.variant();
    match project {
        Some(project) => {
            println!(
                "{}: {}  {}: {}{}",
                variant.id_field_label,
                project.id,
                variant.location_field_label,
                project.location_or_date,
                if session.is_dirty() { "  (未保存)" } else { "" }
            );
            for (i, item) in project.items.iter().enumerate() {
                println!("{}", format_item_line(i, item));
            }
            if project.items.is_empty() {
                println!("  （写真項目なし）");
            }
        }
        None => println!("案件が選択されていません（n: 新規 / o <キー>: 開く）"),
    }
}

/// 対話編集を実行する
pub fn run_interactive_edit(
    mut session: Session,
    stamper: &Stamper,
    options: &GenerateOptions,
    initial_key: Option<&str>,
) -> Result<()> {
    println!(
        "📝 {} - 案件編集（保存方針: {}）\n",
        session.variant().title,
        session.policy()
    );
    if let Some(err) = session.load_error() {
        println!("⚠ 保存データを読み込めませんでした（空の一覧で続行）: {}", err);
    }
    if let Some(key) = initial_key {
        session.select_project(key)?;
        print_project(session.current(), &session);
    }
    println!("{}\n", HELP);

    loop {
        let line = prompt_text(">", "")?;
        let action = match parse_edit_command(&line) {
            Ok(action) => action,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        let outcome: Result<()> = match action {
            EditAction::Projects => {
                let keys = session.project_keys();
                if keys.is_empty() {
                    println!("保存済みの案件はありません");
                }
                for key in keys {
                    println!("  {}", key);
                }
                Ok(())
            }
            EditAction::Open(key) => session.select_project(&key).map(|discarded| {
                if discarded {
                    println!("未保存の変更を破棄しました");
                }
                print_project(session.current(), &session);
            }),
            EditAction::New => {
                if session.new_project() {
                    println!("未保存の変更を破棄しました");
                }
                println!("✔ 新規案件");
                Ok(())
            }
            EditAction::Info => {
                let (id, location) = session
                    .current()
                    .map(|p| (p.id.clone(), p.location_or_date.clone()))
                    .unwrap_or_default();
                let id_label = session.variant().id_field_label.clone();
                let location_label = session.variant().location_field_label.clone();
                prompt_text(&id_label, &id).and_then(|id| {
                    let location = prompt_text(&location_label, &location)?;
                    session.set_info(&id, &location);
                    Ok(())
                })
            }
            EditAction::List => {
                print_project(session.current(), &session);
                Ok(())
            }
            EditAction::Add => prompt_item(&ItemRecord::default()).map(|item| {
                let index = session.add_item(item);
                println!("✔ 項目{}を追加しました", index + 1);
            }),
            EditAction::Update(index) => {
                let current = session
                    .current()
                    .and_then(|p| p.items.get(index))
                    .cloned();
                match current {
                    Some(current) => prompt_item(&current)
                        .and_then(|item| session.update_item(index, item)),
                    None => Err(ReportError::ItemIndex {
                        index: index + 1,
                        len: session.current().map_or(0, |p| p.items.len()),
                    }),
                }
            }
            EditAction::Remove(indices) => session
                .remove_items(&indices)
                .map(|n| println!("✔ {}件削除しました", n)),
            EditAction::Move(from, to) => session.move_item(from, to),
            EditAction::Save => session.save().map(|key| println!("✔ 保存しました: {}", key)),
            EditAction::RemoveProject(key) => session.remove_project(&key).map(|removed| {
                if removed {
                    println!("✔ 削除しました: {}", key);
                } else {
                    println!("案件が見つかりません: {}", key);
                }
            }),
            EditAction::Generate { burn_disc } => {
                let options = GenerateOptions {
                    burn_disc,
                    ..options.clone()
                };
                session.generate(stamper, &options).map(|report| {
                    println!("✅ 生成しました: {}", report.document_path.display());
                    if let Some(archive) = report.archive {
                        println!("  燒光碟: {} ({}枚)", archive.dir.display(), archive.written.len());
                    }
                })
            }
            EditAction::Help => {
                println!("{}", HELP);
                Ok(())
            }
            EditAction::Quit => break,
        };

        if let Err(err) = outcome {
            println!("✖ {}", err);
        }
    }

    if session.close()? {
        println!("✔ 終了時に保存しました");
    }
    Ok(())
}
