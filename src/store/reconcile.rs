//! Tree patching for a single project.
//!
//! A task can live in two places at once: `Project::tasks` and the `tasks` of
//! the milestone it belongs to. Every function here leaves both copies equal,
//! and leaves no milestone listing a task the project does not have.

use crate::models::{Milestone, MilestoneDeletePolicy, Project, Task};

/// Append a milestone, replacing any copy with the same id
pub fn insert_milestone(project: &mut Project, mut milestone: Milestone) {
    milestone.project_id = project.id;
    milestone.tasks = project.tasks_in_milestone(milestone.id).cloned().collect();

    match project.milestone_mut(milestone.id) {
        Some(existing) => *existing = milestone,
        None => project.milestones.push(milestone),
    }
}

/// Replace a milestone's own fields. Its task list is left alone; it follows
/// the tasks, not the milestone payload.
pub fn replace_milestone(project: &mut Project, milestone: Milestone) -> bool {
    let Some(existing) = project.milestone_mut(milestone.id) else {
        return false;
    };

    let tasks = std::mem::take(&mut existing.tasks);
    *existing = Milestone {
        tasks,
        project_id: existing.project_id,
        ..milestone
    };
    true
}

/// Remove a milestone and apply the delete policy to the tasks that referenced
/// it. Returns the ids of tasks that were unlinked or removed.
pub fn remove_milestone(
    project: &mut Project,
    milestone_id: i64,
    policy: MilestoneDeletePolicy,
) -> Vec<i64> {
    project.milestones.retain(|m| m.id != milestone_id);

    let affected: Vec<i64> = project
        .tasks_in_milestone(milestone_id)
        .map(|t| t.id)
        .collect();

    match policy {
        MilestoneDeletePolicy::Unlink => {
            for task in project
                .tasks
                .iter_mut()
                .filter(|t| t.milestone_id == Some(milestone_id))
            {
                task.milestone_id = None;
            }
        }
        MilestoneDeletePolicy::Cascade => {
            project
                .tasks
                .retain(|t| t.milestone_id != Some(milestone_id));
        }
    }

    affected
}

/// Add a new task to the project and to its milestone, if any
pub fn insert_task(project: &mut Project, task: Task) {
    replace_task(project, task);
}

/// Put a task where its `milestone_id` says it belongs.
///
/// The project-level copy is replaced by id (or appended). Milestones are then
/// reconciled: the target milestone gets the new copy (in place when it
/// already held the task), every other milestone drops it.
pub fn replace_task(project: &mut Project, task: Task) {
    match project.tasks.iter_mut().find(|t| t.id == task.id) {
        Some(existing) => *existing = task.clone(),
        None => project.tasks.push(task.clone()),
    }

    if let Some(target) = task.milestone_id {
        if project.milestone(target).is_none() {
            tracing::warn!(
                project_id = project.id,
                task_id = task.id,
                milestone_id = target,
                "Task references a milestone missing from the project"
            );
        }
    }

    for milestone in project.milestones.iter_mut() {
        let position = milestone.tasks.iter().position(|t| t.id == task.id);

        if task.milestone_id == Some(milestone.id) {
            match position {
                Some(index) => milestone.tasks[index] = task.clone(),
                None => milestone.tasks.push(task.clone()),
            }
        } else if let Some(index) = position {
            milestone.tasks.remove(index);
        }
    }
}

/// Remove a task from the project and from every milestone
pub fn remove_task(project: &mut Project, task_id: i64) -> bool {
    let before = project.tasks.len();
    project.tasks.retain(|t| t.id != task_id);

    for milestone in project.milestones.iter_mut() {
        milestone.tasks.retain(|t| t.id != task_id);
    }

    project.tasks.len() != before
}

/// Bring a project received from the server into a consistent shape.
///
/// Tasks that only appear inside a milestone are promoted to the project list,
/// then every milestone's list is rebuilt from the project list so both copies
/// agree.
pub fn normalize_project(project: &mut Project) {
    let project_id = project.id;

    let mut promoted = Vec::new();
    for milestone in project.milestones.iter_mut() {
        milestone.project_id = project_id;
        for task in milestone.tasks.iter() {
            if !project.tasks.iter().any(|t| t.id == task.id)
                && !promoted.iter().any(|t: &Task| t.id == task.id)
            {
                let mut task = task.clone();
                task.milestone_id = Some(milestone.id);
                promoted.push(task);
            }
        }
    }
    project.tasks.extend(promoted);

    for task in project.tasks.iter_mut() {
        task.project_id = project_id;
    }

    let tasks = project.tasks.clone();
    for milestone in project.milestones.iter_mut() {
        milestone.tasks = tasks
            .iter()
            .filter(|t| t.milestone_id == Some(milestone.id))
            .cloned()
            .collect();
    }
}

/// A way in which the two task copies disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// A milestone lists a task the project does not have
    Dangling { milestone_id: i64, task_id: i64 },
    /// The project's task points at a milestone that does not list it
    Missing { milestone_id: i64, task_id: i64 },
    /// A milestone lists a task whose `milestone_id` is elsewhere
    Misplaced { milestone_id: i64, task_id: i64 },
    /// Milestone and project copies of a task differ
    Diverged { task_id: i64 },
    /// The project lists the same task twice
    Duplicate { task_id: i64 },
}

/// Check the project invariants, returning every violation found
pub fn check_consistency(project: &Project) -> Vec<Inconsistency> {
    let mut problems = Vec::new();

    for (index, task) in project.tasks.iter().enumerate() {
        if project.tasks[..index].iter().any(|t| t.id == task.id) {
            problems.push(Inconsistency::Duplicate { task_id: task.id });
        }
        if let Some(milestone_id) = task.milestone_id {
            if let Some(milestone) = project.milestone(milestone_id) {
                if !milestone.tasks.iter().any(|t| t.id == task.id) {
                    problems.push(Inconsistency::Missing {
                        milestone_id,
                        task_id: task.id,
                    });
                }
            }
        }
    }

    for milestone in &project.milestones {
        for task in &milestone.tasks {
            match project.task(task.id) {
                None => problems.push(Inconsistency::Dangling {
                    milestone_id: milestone.id,
                    task_id: task.id,
                }),
                Some(owned) if owned.milestone_id != Some(milestone.id) => {
                    problems.push(Inconsistency::Misplaced {
                        milestone_id: milestone.id,
                        task_id: task.id,
                    })
                }
                Some(owned) if owned != task => {
                    problems.push(Inconsistency::Diverged { task_id: task.id })
                }
                Some(_) => {}
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn project(id: i64) -> Project {
        Project {
            id,
            title: format!("Project {}", id),
            description: None,
            milestones: Vec::new(),
            tasks: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn milestone(id: i64, project_id: i64) -> Milestone {
        Milestone {
            id,
            title: format!("Milestone {}", id),
            description: None,
            project_id,
            start_date: None,
            due_date: None,
            completed: false,
            tasks: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn task(id: i64, project_id: i64, milestone_id: Option<i64>) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: None,
            status: TaskStatus::Todo,
            project_id,
            milestone_id,
            due_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn with_milestones(ids: &[i64]) -> Project {
        let mut p = project(1);
        for id in ids {
            insert_milestone(&mut p, milestone(*id, 1));
        }
        p
    }

    #[test]
    fn test_insert_task_into_milestone() {
        let mut p = with_milestones(&[5]);
        insert_task(&mut p, task(9, 1, Some(5)));
        insert_task(&mut p, task(10, 1, None));

        assert_eq!(p.tasks.len(), 2);
        assert_eq!(p.milestone(5).unwrap().tasks.len(), 1);
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_update_task_in_place() {
        let mut p = with_milestones(&[5]);
        insert_task(&mut p, task(9, 1, Some(5)));

        let mut renamed = task(9, 1, Some(5));
        renamed.title = "Renamed".to_string();
        replace_task(&mut p, renamed);

        assert_eq!(p.tasks.len(), 1);
        assert_eq!(p.milestone(5).unwrap().tasks[0].title, "Renamed");
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_move_task_between_milestones() {
        let mut p = with_milestones(&[5, 6]);
        insert_task(&mut p, task(9, 1, Some(5)));

        replace_task(&mut p, task(9, 1, Some(6)));

        assert!(p.milestone(5).unwrap().tasks.is_empty());
        assert_eq!(p.milestone(6).unwrap().tasks.len(), 1);
        assert_eq!(p.tasks.iter().filter(|t| t.id == 9).count(), 1);
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_unlink_task_from_milestone() {
        let mut p = with_milestones(&[5]);
        insert_task(&mut p, task(9, 1, Some(5)));

        replace_task(&mut p, task(9, 1, None));

        assert!(p.milestone(5).unwrap().tasks.is_empty());
        assert_eq!(p.tasks[0].milestone_id, None);
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_remove_task_everywhere() {
        let mut p = with_milestones(&[5, 6]);
        insert_task(&mut p, task(9, 1, Some(5)));
        // Corrupt on purpose: a stale copy in another milestone
        p.milestone_mut(6).unwrap().tasks.push(task(9, 1, Some(5)));

        assert!(remove_task(&mut p, 9));
        assert!(p.tasks.is_empty());
        assert!(p.milestones.iter().all(|m| m.tasks.is_empty()));
        assert!(!remove_task(&mut p, 9));
    }

    #[test]
    fn test_remove_milestone_unlinks_every_task() {
        let mut p = with_milestones(&[5, 6]);
        insert_task(&mut p, task(9, 1, Some(5)));
        insert_task(&mut p, task(10, 1, Some(5)));
        insert_task(&mut p, task(11, 1, Some(6)));

        let affected = remove_milestone(&mut p, 5, MilestoneDeletePolicy::Unlink);

        assert_eq!(affected, vec![9, 10]);
        assert_eq!(p.tasks.len(), 3);
        assert!(p
            .tasks
            .iter()
            .filter(|t| t.id == 9 || t.id == 10)
            .all(|t| t.milestone_id.is_none()));
        assert_eq!(p.task(11).unwrap().milestone_id, Some(6));
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_remove_milestone_cascades() {
        let mut p = with_milestones(&[5, 6]);
        insert_task(&mut p, task(9, 1, Some(5)));
        insert_task(&mut p, task(10, 1, Some(5)));
        insert_task(&mut p, task(11, 1, Some(6)));

        remove_milestone(&mut p, 5, MilestoneDeletePolicy::Cascade);

        assert_eq!(p.tasks.len(), 1);
        assert_eq!(p.tasks[0].id, 11);
        assert!(p.milestone(5).is_none());
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_replace_milestone_keeps_its_tasks() {
        let mut p = with_milestones(&[5]);
        insert_task(&mut p, task(9, 1, Some(5)));

        let mut update = milestone(5, 1);
        update.completed = true;
        update.title = "Done".to_string();
        assert!(replace_milestone(&mut p, update));

        let m = p.milestone(5).unwrap();
        assert!(m.completed);
        assert_eq!(m.title, "Done");
        assert_eq!(m.tasks.len(), 1);
        assert!(!replace_milestone(&mut p, milestone(99, 1)));
    }

    #[test]
    fn test_normalize_promotes_and_rebuilds() {
        let mut p = project(1);
        let mut m = milestone(5, 1);
        m.tasks.push(task(9, 1, Some(5)));
        p.milestones.push(m);
        p.milestones.push(milestone(6, 1));
        p.tasks.push(task(10, 1, Some(6)));

        normalize_project(&mut p);

        assert_eq!(p.tasks.len(), 2);
        assert_eq!(p.milestone(6).unwrap().tasks.len(), 1);
        assert!(check_consistency(&p).is_empty());
    }

    #[test]
    fn test_check_consistency_reports_problems() {
        let mut p = with_milestones(&[5]);
        p.milestone_mut(5).unwrap().tasks.push(task(9, 1, Some(5)));

        assert_eq!(
            check_consistency(&p),
            vec![Inconsistency::Dangling {
                milestone_id: 5,
                task_id: 9
            }]
        );
    }
}
