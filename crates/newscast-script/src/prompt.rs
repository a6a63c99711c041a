//! Prompt construction from a news digest.
//!
//! The prompt anchors the model to the current Beijing date and daypart so
//! the bulletin opens with the right greeting, then lists every keyword group
//! with its strongest headlines.

use chrono::{DateTime, FixedOffset, Timelike};
use newscast_core::{NewsDigest, beijing_now, format_date_cn, weekday_cn};

/// System role text sent to chat-style providers.
pub const SYSTEM_PROMPT: &str =
    "你是一位专业的财经新闻主播，擅长将复杂信息转化为简洁流畅的口播稿。";

/// Headlines quoted per keyword group.
const MAX_TITLES_PER_KEYWORD: usize = 8;

/// Greeting and daypart name for an hour of the day in Beijing.
pub fn greeting_for_hour(hour: u32) -> (&'static str, &'static str) {
    match hour {
        5..=11 => ("早上好", "上午"),
        12..=13 => ("中午好", "中午"),
        14..=17 => ("下午好", "下午"),
        18..=21 => ("晚上好", "晚上"),
        _ => ("晚上好", "晚间"),
    }
}

/// Build the user prompt for the current Beijing time.
pub fn build_prompt(digest: &NewsDigest) -> String {
    build_prompt_at(digest, &beijing_now())
}

/// Build the user prompt for an explicit timestamp.
pub fn build_prompt_at(digest: &NewsDigest, now: &DateTime<FixedOffset>) -> String {
    let date_str = format_date_cn(now);
    let weekday_str = weekday_cn(now);
    let time_str = format!("{}时{:02}分", now.hour(), now.minute());
    let (greeting, period) = greeting_for_hour(now.hour());

    let mut summaries = Vec::new();
    for (i, stat) in digest.stats.iter().enumerate() {
        let titles: Vec<String> = stat
            .titles
            .iter()
            .take(MAX_TITLES_PER_KEYWORD)
            .map(|entry| {
                let rank = entry.top_rank();
                let rank_info = if rank > 0 {
                    format!(" [排名{rank}]")
                } else {
                    String::new()
                };
                format!("   - 【{}】{}{}", entry.source, entry.title, rank_info)
            })
            .collect();

        if !titles.is_empty() {
            summaries.push(format!(
                "{}. {}相关新闻（共{}条）：\n{}",
                i + 1,
                stat.word,
                stat.count,
                titles.join("\n")
            ));
        }
    }
    let news_text = summaries.join("\n\n");

    format!(
        r#"你是一位专业的财经新闻主播。请根据以下热点新闻，生成一段专业、详细的新闻口播稿。

**重要提示：**
- 当前北京时间：{date_str}，{weekday_str}，{time_str}
- 现在是{period}时段
- 口播稿开头必须使用："{greeting}，今天是{date_str}，{weekday_str}"
- 不要使用错误的时间问候语，必须使用"{greeting}"

要求：
1. 时长控制在2-3分钟（约500-800字），确保信息量充足
2. 语言专业、流畅，适合口播
3. 按重要性排序，涵盖所有主要新闻主题
4. 使用"首先"、"其次"、"此外"、"另外"、"最后"等连接词
5. 每个主题都要有具体内容，不要只是简单列举标题
6. 开头必须使用："{greeting}，今天是{date_str}，{weekday_str}"
7. 结尾要有总结性话语

热点新闻摘要（共{group_count}个主题，{title_count}条新闻）：
{news_text}

请生成详细的口播稿，确保涵盖所有重要新闻："#,
        group_count = digest.stats.len(),
        title_count = digest.total_titles(),
    )
}
