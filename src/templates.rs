use serde::{Deserialize, Serialize};
use std::fmt;

/// Output language for the generated prompt. Also selects which wording of
/// the instruction template is sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh")]
    Zh,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Zh => write!(f, "zh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptLength {
    Short,
    Medium,
    Long,
}

impl fmt::Display for PromptLength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PromptLength::Short => write!(f, "short"),
            PromptLength::Medium => write!(f, "medium"),
            PromptLength::Long => write!(f, "long"),
        }
    }
}

/// The phrase substituted into the instruction templates for each
/// (language, length) combination.
pub fn length_description(language: Language, length: PromptLength) -> &'static str {
    match (language, length) {
        (Language::En, PromptLength::Short) => "a short, concise sentence",
        (Language::En, PromptLength::Medium) => "a medium-length paragraph",
        (Language::En, PromptLength::Long) => "a detailed, long paragraph",
        (Language::Zh, PromptLength::Short) => "一句简短精炼的话",
        (Language::Zh, PromptLength::Medium) => "一段中等长度的段落",
        (Language::Zh, PromptLength::Long) => "一段详细的长段落",
    }
}

/// Instruction sent along with an uploaded image. The trailing directive
/// steers the model into answering with the bare prompt and nothing else.
pub fn build_image_instruction(language: Language, length: PromptLength) -> String {
    let length_desc = length_description(language, length);

    match language {
        Language::En => format!(
            "You are an expert prompt engineer for AI image generation models like Midjourney or DALL-E.\n\
             Analyze this image and describe it in {length_desc}.\n\
             The description will be used as a prompt.\n\
             Respond ONLY with the generated prompt in English. Do not include any other text, preambles, or explanations."
        ),
        Language::Zh => format!(
            "你是一位顶级的AI绘画（例如 Midjourney 或 DALL-E）提示词工程师。\n\
             请分析这张图片，并用{length_desc}描述它。\n\
             这段描述将用作AI绘画的提示词。\n\
             请只用中文返回生成的提示词，不要包含任何其他文字、前言或解释。"
        ),
    }
}

/// Instruction that expands a short user concept into a full prompt. The
/// concept is embedded verbatim inside the quotation marks, nowhere else.
pub fn build_text_instruction(concept: &str, language: Language, length: PromptLength) -> String {
    let length_desc = length_description(language, length);

    match language {
        Language::En => format!(
            "You are an expert prompt engineer for AI image generation models like Midjourney or DALL-E.\n\
             Take the following simple concept and expand it into a detailed, creative, and evocative prompt in {length_desc}.\n\
             The concept is: \"{concept}\"\n\
             The final prompt should be rich in visual detail, specifying elements like setting, mood, lighting, color palette, style, and composition.\n\
             Respond ONLY with the generated prompt in English. Do not include any other text, preambles, or explanations."
        ),
        Language::Zh => format!(
            "你是一位顶级的AI绘画（例如 Midjourney 或 DALL-E）提示词工程师。\n\
             请将以下简单的概念，扩展成一段{length_desc}、充满创意和想象力的详细提示词。\n\
             这个概念是：“{concept}”\n\
             最终的提示词应该富含视觉细节，具体说明场景、氛围、光线、色调、风格和构图等元素。\n\
             请只用中文返回生成的提示词，不要包含任何其他文字、前言或解释。"
        ),
    }
}
