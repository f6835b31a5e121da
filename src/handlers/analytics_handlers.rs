// MindGarden/backend/src/handlers/analytics_handlers.rs

use crate::db::Trackers;
use crate::error_handler::ServiceError;
use crate::models::{entries, MoodEntry, MoodLabel, MoodScoreStat, TaskEntry, TaskStatus, TaskStatusCount};
use actix_web::{get, web, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

// Mean score per mood label, ordered by label text. Labels without entries are left out.
pub fn mean_score_by_mood(moods: &[MoodEntry]) -> Vec<MoodScoreStat> {
    let mut totals: HashMap<MoodLabel, (u32, usize)> = HashMap::new();
    for mood in moods {
        let slot = totals.entry(mood.mood).or_insert((0, 0));
        slot.0 += u32::from(mood.score);
        slot.1 += 1;
    }

    let mut stats: Vec<MoodScoreStat> = totals
        .into_iter()
        .map(|(mood, (sum, count))| MoodScoreStat {
            mood,
            average_score: f64::from(sum) / count as f64,
            entries: count,
        })
        .collect();
    stats.sort_by(|a, b| a.mood.label().cmp(b.mood.label()));
    stats
}

// Tasks per status, most frequent first.
pub fn count_by_status(tasks: &[TaskEntry]) -> Vec<TaskStatusCount> {
    let mut counts: HashMap<TaskStatus, usize> = HashMap::new();
    for task in tasks {
        *counts.entry(task.status).or_insert(0) += 1;
    }

    let mut result: Vec<TaskStatusCount> = counts
        .into_iter()
        .map(|(status, count)| TaskStatusCount { status, count })
        .collect();
    result.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.status.label().cmp(b.status.label()))
    });
    result
}

// === GET /analytics/mood-scores ===
#[get("/mood-scores")]
pub async fn get_mood_scores_handler(
    trackers: web::Data<Trackers>,
) -> ActixResult<HttpResponse, ServiceError> {
    let table = trackers.emotions.read().await?;
    let moods: Vec<MoodEntry> = entries(&table);
    log::debug!("Computing mood score averages over {} entries", moods.len());

    Ok(HttpResponse::Ok().json(mean_score_by_mood(&moods)))
}

// === GET /analytics/task-status ===
#[get("/task-status")]
pub async fn get_task_status_handler(
    trackers: web::Data<Trackers>,
) -> ActixResult<HttpResponse, ServiceError> {
    let table = trackers.priorities.read().await?;
    let tasks: Vec<TaskEntry> = entries(&table);
    log::debug!("Counting task statuses over {} tasks", tasks.len());

    Ok(HttpResponse::Ok().json(count_by_status(&tasks)))
}
