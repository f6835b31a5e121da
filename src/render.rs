// MindGarden/backend/src/render.rs
// Server-rendered dashboard. Plain HTML forms post back to /ui/*.

use crate::handlers::analytics_handlers::{count_by_status, mean_score_by_mood};
use crate::models::{
    Level, MedicationEntry, MoodEntry, MoodLabel, TaskEntry, TaskStatus, DEFAULT_MOOD_NOTE,
    MAX_MOOD_SCORE,
};
use chrono::NaiveDate;

pub const PAGE_TITLE: &str = "마음의 정원";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Flash {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

pub struct Dashboard<'a> {
    pub today: NaiveDate,
    pub medications: &'a [MedicationEntry],
    pub moods: &'a [MoodEntry],
    pub tasks: &'a [TaskEntry],
    pub flashes: &'a [Flash],
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n<h1>{title}</h1>\n",
        title = PAGE_TITLE,
        style = STYLE
    ));

    for flash in dashboard.flashes {
        html.push_str(&render_flash(flash));
    }

    html.push_str(&medication_section(dashboard.medications));
    html.push_str(&mood_section(dashboard.today, dashboard.moods));
    html.push_str(&task_section(dashboard.tasks));
    html.push_str("</body>\n</html>\n");
    html
}

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;}\
.flash{padding:.5rem 1rem;margin:.5rem 0;border-radius:4px;}\
.success{background:#e6f4ea;}.warning{background:#fff4e5;}.error{background:#fdecea;}\
.row{display:flex;justify-content:space-between;align-items:center;margin:.25rem 0;}\
.done{background-color:lightgreen;}\
.chart .bar{display:flex;align-items:center;margin:.2rem 0;}\
.chart .label{width:8rem;}.chart .fill{background:#4e79a7;height:1rem;margin-right:.5rem;}";

fn render_flash(flash: &Flash) -> String {
    let class = match flash.kind {
        FlashKind::Success => "success",
        FlashKind::Warning => "warning",
        FlashKind::Error => "error",
    };
    format!(
        "<div class=\"flash {}\">{}</div>\n",
        class,
        escape_html(&flash.message)
    )
}

fn medication_section(medications: &[MedicationEntry]) -> String {
    let mut html = String::from(
        "<section>\n<h2>💊 복약 관리</h2>\n\
         <form method=\"post\" action=\"/ui/medications\">\n\
         <label>약물 이름 <input name=\"drug_name\" placeholder=\"예: 항우울제\"></label>\n\
         <label>복약 시간 <input type=\"time\" name=\"time\" value=\"09:00\"></label>\n\
         <label>복용 용량 <input name=\"dosage\" placeholder=\"예: 50mg\"></label>\n\
         <button type=\"submit\">추가</button>\n</form>\n\
         <h3>📋 복약 리스트</h3>\n",
    );

    for medication in medications {
        let name = escape_html(&medication.drug_name);
        let dosage = escape_html(&medication.dosage);
        if medication.completed {
            html.push_str(&format!(
                "<div class=\"row\">✅ <span class=\"done\">{} ({})</span></div>\n",
                name, dosage
            ));
        } else {
            html.push_str(&format!(
                "<div class=\"row\"><span>{} ({}) - {}</span>\
                 <form method=\"post\" action=\"/ui/medications/{}/complete\">\
                 <button type=\"submit\">완료</button></form></div>\n",
                name,
                dosage,
                medication.time.format("%H:%M"),
                medication.id
            ));
        }
    }

    html.push_str(
        "<a href=\"/medications/export\" download=\"medications.csv\">복약 데이터 다운로드</a>\n</section>\n",
    );
    html
}

fn mood_section(today: NaiveDate, moods: &[MoodEntry]) -> String {
    let mut html = format!(
        "<section>\n<h2>😊 감정 기록</h2>\n\
         <form method=\"post\" action=\"/ui/emotions\">\n\
         <label>날짜 <input type=\"date\" name=\"date\" value=\"{}\"></label>\n\
         <label>오늘 기분 <select name=\"mood\">{}</select></label>\n\
         <label>기분 점수 <input type=\"range\" name=\"score\" min=\"0\" max=\"{}\" value=\"5\"></label>\n\
         <label>기록 <textarea name=\"note\">{}</textarea></label>\n\
         <button type=\"submit\">기록 추가</button>\n</form>\n\
         <h3>📈 감정 변화 차트</h3>\n",
        today,
        options(MoodLabel::ALL.iter().map(|m| m.label())),
        MAX_MOOD_SCORE,
        escape_html(DEFAULT_MOOD_NOTE)
    );

    if !moods.is_empty() {
        let bars: Vec<(String, f64)> = mean_score_by_mood(moods)
            .into_iter()
            .map(|stat| (stat.mood.label().to_string(), stat.average_score))
            .collect();
        html.push_str(&bar_chart(&bars, f64::from(MAX_MOOD_SCORE)));
    }

    html.push_str(
        "<a href=\"/emotions/export\" download=\"emotion_data.csv\">감정 데이터 다운로드</a>\n</section>\n",
    );
    html
}

fn task_section(tasks: &[TaskEntry]) -> String {
    let levels = || options(Level::ALL.iter().map(|l| l.label()));
    let mut html = format!(
        "<section>\n<h2>🔗 우선순위 정리</h2>\n\
         <form method=\"post\" action=\"/ui/priorities\">\n\
         <label>작업명 <input name=\"task\"></label>\n\
         <label>긴급도 <select name=\"urgency\">{}</select></label>\n\
         <label>중요도 <select name=\"importance\">{}</select></label>\n\
         <button type=\"submit\">작업 추가</button>\n</form>\n\
         <h3>📋 작업 리스트</h3>\n",
        levels(),
        levels()
    );

    for task in tasks {
        html.push_str(&format!(
            "<div class=\"row\"><span>{} - 긴급도: {}, 중요도: {}</span>",
            escape_html(&task.task),
            task.urgency,
            task.importance
        ));
        if task.status == TaskStatus::Pending {
            html.push_str(&format!(
                "<form method=\"post\" action=\"/ui/priorities/{}/complete\">\
                 <button type=\"submit\">완료</button></form>",
                task.id
            ));
        }
        html.push_str("</div>\n");
    }

    let counts = count_by_status(tasks);
    if let Some(max) = counts.iter().map(|c| c.count).max() {
        let bars: Vec<(String, f64)> = counts
            .iter()
            .map(|c| (c.status.label().to_string(), c.count as f64))
            .collect();
        html.push_str(&bar_chart(&bars, max as f64));
    }

    html.push_str(
        "<a href=\"/priorities/export\" download=\"priorities.csv\">작업 데이터 다운로드</a>\n</section>\n",
    );
    html
}

fn options<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels
        .map(|label| {
            let label = escape_html(label);
            format!("<option value=\"{0}\">{0}</option>", label)
        })
        .collect()
}

fn bar_chart(bars: &[(String, f64)], max: f64) -> String {
    let mut html = String::from("<div class=\"chart\">\n");
    for (label, value) in bars {
        let percent = if max > 0.0 {
            (value / max * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        html.push_str(&format!(
            "<div class=\"bar\"><span class=\"label\">{}</span>\
             <span class=\"fill\" style=\"width:{:.1}%\"></span><span>{:.2}</span></div>\n",
            escape_html(label),
            percent,
            value
        ));
    }
    html.push_str("</div>\n");
    html
}
