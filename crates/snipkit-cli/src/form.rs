use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use snipkit_engine::{InputFieldDefinition, InputFieldKind};

pub enum FormAction {
    Continue,
    Submit,
    Cancel,
}

/// Modal form state for the interactive fields of one template.
pub struct FormState {
    fields: Vec<InputFieldDefinition>,
    text: Vec<String>,
    option: Vec<usize>,
    focus: usize,
}

impl FormState {
    pub fn new(fields: &[InputFieldDefinition]) -> Self {
        let text = fields
            .iter()
            .map(|field| match field.kind {
                InputFieldKind::Text => field.default_value.clone().unwrap_or_default(),
                InputFieldKind::Select => String::new(),
            })
            .collect();
        let option = fields
            .iter()
            .map(|field| {
                field
                    .default_value
                    .as_ref()
                    .and_then(|default| field.options.iter().position(|o| o == default))
                    .unwrap_or(0)
            })
            .collect();
        Self {
            fields: fields.to_vec(),
            text,
            option,
            focus: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        let count = self.fields.len();
        if count == 0 {
            return FormAction::Submit;
        }
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::BackTab => self.focus = (self.focus + count - 1) % count,
            KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.focus = (self.focus + count - 1) % count
            }
            KeyCode::Tab => self.focus = (self.focus + 1) % count,
            KeyCode::Left => self.cycle_option(false),
            KeyCode::Right => self.cycle_option(true),
            KeyCode::Backspace => {
                if self.fields[self.focus].kind == InputFieldKind::Text {
                    self.text[self.focus].pop();
                }
            }
            KeyCode::Char(c) => {
                if self.fields[self.focus].kind == InputFieldKind::Text {
                    self.text[self.focus].push(c);
                }
            }
            _ => {}
        }
        FormAction::Continue
    }

    fn cycle_option(&mut self, forward: bool) {
        let field = &self.fields[self.focus];
        let len = field.options.len();
        if field.kind != InputFieldKind::Select || len == 0 {
            return;
        }
        let current = self.option[self.focus];
        self.option[self.focus] = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
    }

    fn display_value(&self, index: usize) -> String {
        let field = &self.fields[index];
        match field.kind {
            InputFieldKind::Text => self.text[index].clone(),
            InputFieldKind::Select => field
                .options
                .get(self.option[index])
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Submitted values keyed by field id.
    pub fn values(&self) -> HashMap<String, String> {
        (0..self.fields.len())
            .map(|i| (self.fields[i].id.clone(), self.display_value(i)))
            .collect()
    }

    pub fn render(&self, f: &mut Frame) {
        let height = self.fields.len() as u16 + 4;
        let area = centered(f.area(), 60, height);
        f.render_widget(Clear, area);

        let mut lines: Vec<Line> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = match field.kind {
                    InputFieldKind::Text => self.display_value(i),
                    InputFieldKind::Select => format!("< {} >", self.display_value(i)),
                };
                let style = if i == self.focus {
                    Style::default().bg(Color::Yellow).fg(Color::Black)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{}: ", field.label), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(value, style),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(
            "Tab/Shift+Tab: Move | ←/→: Choose | Enter: Expand | Esc: Cancel",
        ));

        let form = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Fill in template"),
        );
        f.render_widget(form, area);
    }
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
