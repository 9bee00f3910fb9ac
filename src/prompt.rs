//! Prompt text for the identity-locked presenter portrait.

/// The presenter whose portrait is generated.
#[derive(Debug, Clone)]
pub struct Presenter<'a> {
    /// Stable tag repeated in every segment's prompt.
    pub character_key: &'a str,
    pub identity_descriptor: &'a str,
    pub company_name: &'a str,
}

pub const NEGATIVE_PROMPT: &str = "identity change, different person, mismatched face, face morphing, \
young-looking, baby face, youthful appearance, twenties, thirties, 20s, 30s, 20-40 years old, \
skin tone change, skin color change, lighter skin, darker skin, pale, tanned, \
color cast, white balance shift, hue shift, saturation shift, exposure shift, contrast shift, \
background change, camera movement, pan, tilt, zoom, dolly, push-in, parallax, reframe, crop change, angle change, focal length change, \
lighting change, decor moved, brand color shift, \
low quality, cartoon, anime, cgi, avatar, blur, pixelation, oversharpen, uncanny, waxy skin, \
watermark, logo, on-screen text, fast-talking, rapid speech";

/// Builds the positive prompt for one spoken segment.
pub fn build_prompt(presenter: &Presenter<'_>, segment_text: &str) -> String {
    let identity_lock = format!(
        "This video MUST feature the SAME person across all segments. \
         Character Key: {}. Identity description: {}. \
         Age strictly in the fifties (50–59). Do NOT depict ages 20–40. \
         Skin tone/color must remain EXACTLY the same across all segments; do NOT lighten, darken, desaturate, or change hue. \
         Do NOT change identity, gender, age, hair style/color, facial hair, clothing, or background across segments.",
        presenter.character_key, presenter.identity_descriptor
    );
    let background_lock = format!(
        "Fixed professional corporate office environment of \"{}\". \
         Locked-off tripod shot with identical camera position, angle, focal length, framing, subject distance, and crop for every segment. \
         Same decor and background arrangement (glass walls, modern office), consistent neutral brand color palette, and IDENTICAL lighting and white balance to preserve skin tone. \
         No camera movement (no pan, no tilt, no zoom, no dolly), no parallax, no reframing, no crop changes, no background element movement, no lighting and white-balance changes.",
        presenter.company_name
    );
    format!(
        "Cinematic portrait of a real person. {} {} \
         Close-up head and shoulders, looking at camera, speaking slowly (±110 WPM) with ~300ms pauses at commas and ~700ms at sentence ends, \
         saying: \"{}\". Soft natural studio lighting, realistic skin tones, detailed skin texture, sharp eyes, shallow depth of field, \
         smooth bokeh, 4K, natural expression, live-action, documentary, interview framing, natural lip sync.",
        identity_lock, background_lock, segment_text
    )
}
