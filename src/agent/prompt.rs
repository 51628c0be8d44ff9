//! Prompt builders for the executor and checker roles.
//!
//! Three variants exist: the initial executor prompt, the checker prompt,
//! and the feedback prompt that relays a rejection back to the executor.
//! All are pure functions of their inputs.
//!
//! The verdict protocol is in Russian; the checker is required to open its
//! reply with one of the marker phrases from [`crate::verdict`], and the
//! classifier depends on those exact substrings appearing.

use crate::verdict::{ACCEPTED_MARKER, REJECTED_MARKER};

/// Prompt for the executor's first turn on a task.
///
/// `report_path` is where the executor must write its completion report.
pub fn initial_executor(task_text: &str, report_path: &str) -> String {
    format!(
        "Ты агент-исполнитель. Тебе поручена задача.\n\
         \n\
         ЗАДАЧА ДЛЯ ВЫПОЛНЕНИЯ:\n\
         {task_text}\n\
         \n\
         ПРАВИЛА:\n\
         1. Выполни задачу полностью и точно\n\
         2. НЕ объявляй о готовности до полного выполнения\n\
         3. Если что-то не работает - исправляй до достижения результата\n\
         4. В конце работы создай файл {report_path} с описанием того, что сделано\n\
         \n\
         Начинай выполнение задачи."
    )
}

/// Prompt for a checker turn.
///
/// The checker always starts a fresh conversation and must answer with one
/// of the two marker phrases.
pub fn checker(task_text: &str) -> String {
    format!(
        "Ты строгий агент-проверяющий. Проверь результат работы исполнителя.\n\
         \n\
         ЗАДАЧА ДЛЯ ПРОВЕРКИ:\n\
         {task_text}\n\
         \n\
         МЕТОДОЛОГИЯ ПРОВЕРКИ:\n\
         1. Прочитай КАЖДЫЙ критерий приемки в задаче\n\
         2. Открой и изучи все файлы результата - отчеты, скриншоты, код\n\
         3. НЕ доверяй утверждениям исполнителя - проверяй самостоятельно\n\
         4. Если хотя бы один критерий не выполнен - задача не выполнена\n\
         \n\
         ФОРМАТ ОТВЕТА (ОБЯЗАТЕЛЬНО):\n\
         \n\
         Если все критерии выполнены:\n\
         \"{ACCEPTED_MARKER}: [подтверждение каждого критерия]\"\n\
         \n\
         Если хотя бы один критерий не выполнен:\n\
         \"{REJECTED_MARKER}: [точное указание каждого нарушенного критерия]\"\n\
         \n\
         Будь максимально придирчивым и объективным. Начинай проверку."
    )
}

/// Prompt relaying checker feedback back to the executor.
pub fn feedback(prior_checker_text: &str) -> String {
    format!(
        "Агент-проверяющий проанализировал результат твоей работы:\n\
         \n\
         {prior_checker_text}\n\
         \n\
         Продолжи работу над задачей с учетом этой обратной связи."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_executor_embeds_task_and_report_path() {
        let prompt = initial_executor("## Goal\nfix the login", ".tandem/execution_report.md");
        assert!(prompt.contains("## Goal\nfix the login"));
        assert!(prompt.contains(".tandem/execution_report.md"));
    }

    #[test]
    fn test_checker_embeds_task_and_both_markers() {
        let prompt = checker("## Goal\nfix the login");
        assert!(prompt.contains("## Goal\nfix the login"));
        assert!(prompt.contains(ACCEPTED_MARKER));
        assert!(prompt.contains(REJECTED_MARKER));
    }

    #[test]
    fn test_feedback_embeds_prior_verdict() {
        let prompt = feedback("ЗАДАЧА НЕ ВЫПОЛНЕНА: нет скриншота");
        assert!(prompt.contains("ЗАДАЧА НЕ ВЫПОЛНЕНА: нет скриншота"));
    }

    #[test]
    fn test_builders_are_deterministic() {
        assert_eq!(checker("task"), checker("task"));
        assert_eq!(feedback("x"), feedback("x"));
        assert_eq!(
            initial_executor("task", "report.md"),
            initial_executor("task", "report.md")
        );
    }
}
