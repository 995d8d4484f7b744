//! Terminal prompts and the interactive game picker

use dialoguer::{theme::ColorfulTheme, Input};

use steam_manifest::{AppSelector, GameInfo};

/// Ask for the game name or AppID to search for
pub fn ask_query() -> anyhow::Result<String> {
    let query: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("please input a game name or AppID")
        .interact_text()?;
    Ok(query.trim().to_string())
}

/// Shows the search hits as a table and asks for an index
pub struct TableSelector;

impl AppSelector for TableSelector {
    type Error = anyhow::Error;

    fn choose(&self, games: &[GameInfo]) -> anyhow::Result<usize> {
        print!("{}", render_table(games));
        let count = games.len();
        let index = Input::<usize>::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("please input a game index[0-{}]", count.saturating_sub(1)))
            .validate_with(move |index: &usize| index_in_range(*index, count))
            .interact_text()?;
        Ok(index)
    }
}

fn index_in_range(index: usize, count: usize) -> Result<(), String> {
    if index < count {
        Ok(())
    } else {
        Err(format!("index out of range, expected 0-{}", count.saturating_sub(1)))
    }
}

fn render_table(games: &[GameInfo]) -> String {
    let header = ["Index", "AppID", "GameName", "GameType", "SchineseName"].map(String::from);
    let rows: Vec<[String; 5]> = games
        .iter()
        .enumerate()
        .map(|(i, game)| {
            [
                i.to_string(),
                game.app_id.to_string(),
                game.name.clone(),
                game.kind.clone(),
                game.schinese_name.clone(),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
    out
}
