//! Full page rendering, derived from the view-model

use crate::form::{form_fields, FieldKind, FormFields};
use crate::presenter::{ButtonState, Presenter, ViewState};
use crate::render::escape_html;
use crate::tabs::Tab;
use chrono::NaiveDateTime;

/// Everything needed to draw the page
#[derive(Debug, Clone)]
pub struct PageModel {
    pub api_key: String,
    pub view: ViewState,
    pub forms: Vec<(Tab, FormFields)>,
    pub buttons: Vec<(Tab, ButtonState)>,
}

impl PageModel {
    /// Capture the presenter's state, with date and time inputs pre-filled from `now`
    pub async fn capture(presenter: &Presenter, now: NaiveDateTime) -> Self {
        Self {
            api_key: presenter.api_key().await,
            view: presenter.view().await,
            forms: Tab::ALL
                .into_iter()
                .map(|tab| (tab, FormFields::prefilled(tab, now)))
                .collect(),
            buttons: Tab::ALL
                .into_iter()
                .map(|tab| (tab, presenter.button_state(tab)))
                .collect(),
        }
    }

    fn form(&self, tab: Tab) -> Option<&FormFields> {
        self.forms.iter().find(|(t, _)| *t == tab).map(|(_, f)| f)
    }

    fn button(&self, tab: Tab) -> ButtonState {
        self.buttons
            .iter()
            .find(|(t, _)| *t == tab)
            .map(|(_, b)| b.clone())
            .unwrap_or(ButtonState {
                label: tab.submit_label(),
                disabled: false,
            })
    }
}

fn active_class(base: &str, active: bool) -> String {
    if active {
        format!("{} active", base)
    } else {
        base.to_string()
    }
}

fn render_form(model: &PageModel, tab: Tab) -> String {
    let empty = FormFields::new();
    let values = model.form(tab).unwrap_or(&empty);

    let mut html = format!(r#"<form id="{}">"#, tab.form_id());
    html.push('\n');

    for spec in form_fields(tab) {
        let value = escape_html(values.get(spec.name).unwrap_or(""));
        let required = if spec.required { " required" } else { "" };
        let id = format!("{}-{}", tab.id(), spec.name);

        html.push_str(&format!(
            r#"<div class="form-group"><label for="{}">{}</label>"#,
            id, spec.label
        ));
        match spec.kind {
            FieldKind::TextArea => html.push_str(&format!(
                r#"<textarea id="{}" name="{}" rows="3"{}>{}</textarea>"#,
                id, spec.name, required, value
            )),
            kind => html.push_str(&format!(
                r#"<input type="{}" id="{}" name="{}" value="{}"{}>"#,
                kind.input_type(),
                id,
                spec.name,
                value,
                required
            )),
        }
        html.push_str("</div>\n");
    }

    let button = model.button(tab);
    html.push_str(&format!(
        r#"<button type="submit"{}>{}</button>"#,
        if button.disabled { " disabled" } else { "" },
        button.label
    ));
    html.push_str("\n</form>");
    html
}

/// Render the whole page
pub fn render_page(model: &PageModel) -> String {
    let tabs = &model.view.tabs;

    let buttons: String = tabs
        .markers()
        .map(|(tab, active)| {
            format!(
                r#"<button class="{}" data-tab="{}">{}</button>"#,
                active_class("tab-btn", active),
                tab.id(),
                tab.title()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let panels: String = tabs
        .markers()
        .map(|(tab, active)| {
            format!(
                r#"<div id="{}" class="{}">{}</div>"#,
                tab.id(),
                active_class("tab-content", active),
                render_form(model, tab)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let results_class = if tabs.results_visible() {
        "results"
    } else {
        "results hidden"
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Transit Optimizer</title>
    <style>
        .hidden {{ display: none; }}
        .tab-content {{ display: none; }}
        .tab-content.active {{ display: block; }}
        .tab-btn.active {{ font-weight: bold; }}
        .best-result {{ border: 2px solid #f59e0b; }}
        .prop-label {{ color: #888; margin-right: 8px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="form-group">
            <label for="api-key">Google Maps API Key</label>
            <input type="password" id="api-key" value="{api_key}">
        </div>
        <div class="tabs">
{buttons}
        </div>
        <div id="steps-text" class="instructions">{instructions}</div>
{panels}
        <div id="results-area" class="{results_class}">
            <div id="results-content">{results}</div>
        </div>
    </div>
</body>
</html>
"##,
        api_key = escape_html(&model.api_key),
        buttons = buttons,
        instructions = tabs.instructions_html(),
        panels = panels,
        results_class = results_class,
        results = model.view.results.html(),
    )
}
