//! Prompt catalog — pure functions from skill parameters to the system
//! prompt sent ahead of the user's text.

use crate::levels::{MAX_STYLE_LEVEL, MIN_STYLE_LEVEL};

/// Rubric shared by the detect and critique prompts.
const LEVEL_RUBRIC: &str = "包装等级说明:
'-2': '朴实直接，毫无修饰',
'-1': '简单高效，去芜存菁',
'0': '标准表达，不偏不倚，中庸之道',
'1': '适度修饰，讲究表达技巧，稍显刻意',
'2': '过度包装，术语堆砌，已不讲人话'";

/// Target style for each adjust level.
fn adjust_description(level: i32) -> &'static str {
    match level.clamp(MIN_STYLE_LEVEL, MAX_STYLE_LEVEL) {
        -2 => "去除一切表达技法，用最简化、最直接、最朴实的方式表达",
        -1 => "去除不必要的修饰，适度表达",
        0 => "保持原风格不变",
        1 => "增加专业术语和适度包装",
        _ => "使用巨量的行业黑话、专业词汇，完全不考虑通俗易懂，目的就是要让人看不懂，觉得很专业",
    }
}

/// Rewrite the text at `level` (clamped to the supported range).
pub fn style_adjust(level: i32) -> String {
    format!(
        "请将以下文案调整为{}的风格，请直接输出调整后的文案，不要包含任何解释或说明。",
        adjust_description(level)
    )
}

/// Classify the text; the reply should be a bare integer.
pub fn detect_style() -> String {
    format!(
        "请分析以下文案的包装等级，从-3到2选择一个最匹配的数字:

{LEVEL_RUBRIC}

请只返回一个数字(-2到2)，不要包含任何其他文字或解释。"
    )
}

/// Explain why the text was rated `level`.
pub fn critique(level: i32) -> String {
    format!(
        "解释为何以下文字内容的包装等级为何被评为 {level}级 ，并给出犀利点评, 注意只从文字表达的角度分析, 不要评价内容：

{LEVEL_RUBRIC}

要求：
1. 先说明评为该等级的具体原因
2. 分析文案中的典型包装特征
3. 50字以内"
    )
}

pub fn truth_analysis() -> String {
    "请剥去以下文案的全部包装，用一两句大白话说出它实际表达的真实意思。\
     只输出翻译后的大白话，不要解释。"
        .to_string()
}

pub fn hidden_meaning() -> String {
    "请分析以下文案的言外之意：作者没有明说、但希望读者接收到的潜台词是什么？\
     分点列出，每点不超过30字。"
        .to_string()
}

pub fn style_summary() -> String {
    "请从用词、句式、语气、修辞四个方面总结以下文案的写作风格特征，\
     每个方面一句话，总字数100字以内。"
        .to_string()
}

/// Write something new about `topic` in the style of the user's text.
pub fn imitation(topic: &str) -> String {
    format!(
        "请模仿以下文案的写作风格（用词习惯、句式结构、语气和修辞手法），\
         以「{topic}」为主题写一段新的文案。篇幅与原文相近，直接输出新文案，不要解释。"
    )
}

pub fn continuation() -> String {
    "请以完全相同的风格和语气续写以下文案，续写部分篇幅与原文相近。\
     只输出续写的内容，不要重复原文，不要解释。"
        .to_string()
}

pub fn expansion() -> String {
    "请在保持原有风格和观点不变的前提下扩写以下文案，补充细节、例子和论证，\
     篇幅扩展到原文的两到三倍。直接输出扩写后的完整文案，不要解释。"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_adjust_levels() {
        assert!(style_adjust(-2).contains("最朴实"));
        assert!(style_adjust(0).contains("保持原风格不变"));
        assert!(style_adjust(2).contains("行业黑话"));
        assert!(style_adjust(1).ends_with("不要包含任何解释或说明。"));
    }

    #[test]
    fn test_style_adjust_clamps() {
        assert_eq!(style_adjust(7), style_adjust(2));
        assert_eq!(style_adjust(-9), style_adjust(-2));
    }

    #[test]
    fn test_detect_asks_for_number_only() {
        let prompt = detect_style();
        assert!(prompt.contains("请只返回一个数字"));
        assert!(prompt.contains("'2': '过度包装，术语堆砌，已不讲人话'"));
    }

    #[test]
    fn test_critique_embeds_level() {
        let prompt = critique(1);
        assert!(prompt.contains("被评为 1级"));
        assert!(prompt.contains("50字以内"));
        assert_ne!(critique(1), critique(-1));
    }

    #[test]
    fn test_imitation_embeds_topic() {
        assert!(imitation("周一早会").contains("以「周一早会」为主题"));
    }

    #[test]
    fn test_prompts_are_pure() {
        assert_eq!(detect_style(), detect_style());
        assert_eq!(expansion(), expansion());
        for prompt in [
            truth_analysis(),
            hidden_meaning(),
            style_summary(),
            continuation(),
            expansion(),
        ] {
            assert!(!prompt.trim().is_empty());
        }
    }
}
