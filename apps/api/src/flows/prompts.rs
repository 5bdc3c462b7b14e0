// Prompt constants for every reading flow.
// Templates use `{field}` placeholders filled by `flows::render_prompt` before sending.
// JSON-only and schema instructions are appended by llm_client.

// ────────────────────────────────────────────────────────────────────────────
// Astrology
// ────────────────────────────────────────────────────────────────────────────

pub const ASTROLOGER_SYSTEM: &str = "You are an expert astrologer. You read charts carefully, \
    honour the astrological system the user chose and write in a warm, grounded tone.";

/// Replace `{astrology_system}`, `{birth_date}`, `{birth_time}`, `{birth_location}`.
pub const CHART_PROMPT_TEMPLATE: &str = r#"Interpret the astrological chart described below.

Astrological system: {astrology_system}
Perform every calculation under that system. Use the birth location for house and ascendant placement.

Birth date: {birth_date}
Birth time: {birth_time}
Birth location: {birth_location}

Fill in every field:
- personalityTraits: the personality the chart describes.
- lifeTendencies: recurring life tendencies and likely challenges.
- keyInsights: strengths and areas for growth.
- nextMonthForecast: a short forecast for the coming month.
- nextThreeYearsForecast: a short forecast for the next three years.
- significantEvents: notable life events the chart suggests, with their probable timing."#;

/// Replace `{birth_date}`, `{birth_time}`, `{birth_location}`, `{current_date}`.
pub const MONTHLY_PROMPT_TEMPLATE: &str = r#"Birth date: {birth_date}
Birth time: {birth_time}
Birth location: {birth_location}
Today's date: {current_date}

Write a personalised forecast for the current month (thisMonthForecast) and for the month after it (nextMonthForecast).
Focus on the major planetary transits and how they are likely to play out in this person's life.
Blend traditional interpretation with a modern, psychological reading. Keep the two forecasts distinct."#;

/// Replace `{birth_date}`, `{birth_time}`, `{birth_location}`, `{current_full_date}`,
/// `{current_year}`, `{next_year}`, `{year_after_next}`.
pub const YEARLY_PROMPT_TEMPLATE: &str = r#"Birth date: {birth_date}
Birth time: {birth_time}
Birth location: {birth_location}
Today is {current_full_date}.

Give a brief outlook for each of these calendar years, naming the key planetary influences and life themes:
- thisYearOutlook: {current_year}
- nextYearOutlook: {next_year}
- yearAfterNextOutlook: {year_after_next}

Optionally add generalSignificantEvents for anything notable in the next three years that the yearly outlooks do not cover."#;

/// Replace `{birth_date}`, `{birth_time}`, `{birth_location}`, `{start_year}`, `{number_of_years}`.
pub const LIFETIME_PROMPT_TEMPLATE: &str = r#"Birth date: {birth_date}
Birth time: {birth_time}
Birth location: {birth_location}

Starting with {start_year}, write one forecast for each of the next {number_of_years} calendar years.
Each forecast is one or two lines at most and speaks to overarching themes, planetary influences or shifts between life phases rather than definite events.
Return every year in order as {"year": <number>, "forecast": "<text>"} entries in the forecasts array, {number_of_years} entries in total."#;

/// Replace `{sign}`.
pub const ZODIAC_DETAILS_PROMPT_TEMPLATE: &str = r#"Write a complete profile of the zodiac sign {sign}.

- sign: the sign's name.
- symbol: its traditional symbol, e.g. "The Ram" for Aries.
- element: Fire, Earth, Air or Water.
- modality: Cardinal, Fixed or Mutable.
- rulingPlanet: the main ruling planet.
- strengths: three to five positive keywords.
- weaknesses: three to five challenging keywords.
- personality: a paragraph on the core personality.
- loveAndRelationships: a paragraph on love, romance and partnership.
- career: a paragraph on professional strengths and suitable careers."#;

// ────────────────────────────────────────────────────────────────────────────
// Image readings
// ────────────────────────────────────────────────────────────────────────────

pub const PALM_SYSTEM: &str =
    "You are an expert palm reader trained in traditional palmistry.";

/// The palm photo is attached as the image that precedes this text.
pub const PALM_PROMPT: &str = r#"Read the palm in the attached image.

Examine the heart, head, life and fate lines, the mounts and any notable markings, then answer with:
- summary: one or two sentences summing up the reading.
- keyPredictions: three to seven short, distinct predictions, ideally covering different areas of life such as love, career, personality and health.
- detailedAnalysis: an in-depth traditional analysis of the lines, hand and finger shape, mounts and markings you can see, with their meanings.

If the image cannot be read (blurry, too dark, not a palm) or a meaningful reading is impossible for any other reason, set "error" to a short explanation and leave the other fields empty."#;

pub const FACE_SYSTEM: &str = "You are an expert physiognomist trained in traditional face reading. \
    Keep the tone positive or neutral and constructive.";

/// The face photo is attached as the image that precedes this text.
pub const FACE_PROMPT: &str = r#"Read the face in the attached image.

Look at the overall face shape, forehead, eyes, eyebrows, nose, mouth, lips and chin, then answer with:
- overallImpression: one to three sentences of overall impression.
- prominentFeatures: two to five entries, each naming a feature and giving its traditional interpretation.
- personalityInsights: three to six personality traits the face suggests.
- potentialLifeAspects: two to four sentences on strengths, challenges and life aspects suggested by the features together.

If the image cannot be read (blurry, unclear, features obscured, not a face, or the image could not be fetched), set "error" to a short explanation and leave the other fields empty."#;

// ────────────────────────────────────────────────────────────────────────────
// Chat
// ────────────────────────────────────────────────────────────────────────────

pub const CHAT_SYSTEM: &str = "You are a friendly, deeply knowledgeable AI astrologer. \
    Answer conversationally and keep replies to a length that suits a chat.";

/// Replace `{reading}`, `{history}`, `{message}`.
pub const CHAT_PROMPT_TEMPLATE: &str = r#"The user's astrological reading:
{reading}

Conversation so far:
{history}

The user's new message: {message}

Reply in the "response" field. Refer to specifics of the user's reading wherever they are relevant."#;

pub const CHAT_NO_READING: &str = "(The user has not shared a reading yet. Answer from general astrology.)";

pub const CHAT_NO_HISTORY: &str = "(This is the first message.)";

// ────────────────────────────────────────────────────────────────────────────
// Translation
// ────────────────────────────────────────────────────────────────────────────

pub const TRANSLATOR_SYSTEM: &str = "You are a professional translator of structured content.";

/// Replace `{target_language}`, `{json}`.
pub const OBJECT_TRANSLATION_PROMPT_TEMPLATE: &str = r#"Translate every string value in the JSON below into {target_language}.

Rules:
- Keep exactly the same structure: every key, every nesting level, every array in the same order and length.
- Never translate keys.
- Leave numbers, booleans and nulls exactly as they are.
- Translate each string inside arrays, and recurse into nested objects and arrays of objects.

Put the translated JSON under "translatedObject".

JSON to translate:
{json}"#;
