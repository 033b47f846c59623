//! Windows SAPI backend (System.Speech via PowerShell)
//!
//! Usable from native Windows and from WSL through interop. Each request
//! starts a PowerShell process that renders speech and writes it back
//! base64-encoded. The request travels on stdin: the first line is the voice
//! token id (empty for the default voice), the rest is the text.
//!
//! Voices are listed straight from the two token registries:
//! - `Speech_OneCore\Voices\Tokens` - Standard
//! - `Speech\Voices\Tokens` - LegacyCompatible
//!
//! Legacy tokens and the default voice render through System.Speech directly
//! into 16 kHz mono. System.Speech cannot see OneCore tokens, so those render
//! through `Windows.Media.SpeechSynthesis` as a WAV that is converted here.

use crate::audio::convert::wav_to_pcm;
use crate::speech::voices::{order_by_provenance, Provenance, VoiceDirectory, VoiceEntry};
use crate::speech::{EngineOutput, OwnedOutput, SynthesisEngine};
use crate::{Result, SpeakpadError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, error};
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;

const SYNTH_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
[Console]::InputEncoding = [System.Text.Encoding]::UTF8

$voice = [Console]::In.ReadLine()
$text = [Console]::In.ReadToEnd()

Add-Type -AssemblyName System.Speech
$synth = New-Object System.Speech.Synthesis.SpeechSynthesizer
$classic = $null
if ($voice) {
    $classic = $synth.GetInstalledVoices() |
        Where-Object { $_.VoiceInfo.Id -eq $voice -or $_.VoiceInfo.Name -eq $voice } |
        Select-Object -First 1
}

if (-not $voice -or $classic) {
    if ($classic) { $synth.SelectVoice($classic.VoiceInfo.Name) }
    $format = New-Object System.Speech.AudioFormat.SpeechAudioFormatInfo(16000,
        [System.Speech.AudioFormat.AudioBitsPerSample]::Sixteen,
        [System.Speech.AudioFormat.AudioChannel]::Mono)
    $stream = New-Object System.IO.MemoryStream
    $synth.SetOutputToAudioStream($stream, $format)
    $synth.Speak($text)
    $synth.SetOutputToNull()
    [Console]::Out.Write('pcm:' + [Convert]::ToBase64String($stream.ToArray()))
    exit 0
}

# OneCore voices are only reachable through Windows.Media.SpeechSynthesis
Add-Type -AssemblyName System.Runtime.WindowsRuntime
$null = [Windows.Media.SpeechSynthesis.SpeechSynthesizer, Windows.Media.SpeechSynthesis, ContentType = WindowsRuntime]
$info = [Windows.Media.SpeechSynthesis.SpeechSynthesizer]::AllVoices |
    Where-Object { $_.Id -eq $voice -or $_.Id.EndsWith('\' + $voice) } |
    Select-Object -First 1
if (-not $info) {
    [Console]::Error.WriteLine("voice not installed: $voice")
    exit 2
}

$asTask = [System.WindowsRuntimeSystemExtensions].GetMethods() |
    Where-Object {
        $_.Name -eq 'AsTask' -and $_.GetParameters().Count -eq 1 -and
        $_.GetParameters()[0].ParameterType.Name -eq 'IAsyncOperation`1'
    } |
    Select-Object -First 1
$winrt = New-Object Windows.Media.SpeechSynthesis.SpeechSynthesizer
$winrt.Voice = $info
$task = $asTask.MakeGenericMethod([Windows.Media.SpeechSynthesis.SpeechSynthesisStream]).Invoke($null, @($winrt.SynthesizeTextToStreamAsync($text)))
$task.Wait()
$reader = [System.IO.WindowsRuntimeStreamExtensions]::AsStreamForRead($task.Result)
$wav = New-Object System.IO.MemoryStream
$reader.CopyTo($wav)
[Console]::Out.Write('wav:' + [Convert]::ToBase64String($wav.ToArray()))
"#;

const VOICES_SCRIPT: &str = r#"
$roots = @(
    @{ Path = 'HKLM:\SOFTWARE\Microsoft\Speech_OneCore\Voices\Tokens'; Kind = 'standard' },
    @{ Path = 'HKLM:\SOFTWARE\Microsoft\Speech\Voices\Tokens'; Kind = 'legacy' }
)
$tokens = foreach ($root in $roots) {
    if (Test-Path $root.Path) {
        Get-ChildItem $root.Path | ForEach-Object {
            $attrs = Join-Path $_.PSPath 'Attributes'
            $name = (Get-ItemProperty -Path $attrs -Name Name -ErrorAction SilentlyContinue).Name
            [pscustomobject]@{ id = $_.PSChildName; name = $name; kind = $root.Kind }
        }
    }
}
ConvertTo-Json -InputObject @($tokens) -Compress
"#;

/// Find PowerShell executable (native or through WSL interop)
pub fn find_powershell() -> Result<String> {
    let paths = [
        "powershell.exe",
        "/mnt/c/Windows/System32/WindowsPowerShell/v1.0/powershell.exe",
    ];

    for path in paths {
        if let Ok(status) = Command::new(path)
            .arg("-NoProfile")
            .arg("-Command")
            .arg("$PSVersionTable.PSVersion")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            if status.success() {
                return Ok(path.to_string());
            }
        }
    }

    Err(SpeakpadError::Speech(
        "PowerShell not found. WSL interop may not be enabled.".to_string(),
    ))
}

/// Run a PowerShell script, feeding `input` on stdin
fn run_script(powershell_path: &str, script: &str, input: Option<String>) -> Result<Output> {
    let mut child = Command::new(powershell_path)
        .arg("-NoProfile")
        .arg("-NonInteractive")
        .arg("-Command")
        .arg(script)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            error!("Failed to spawn PowerShell: {}", e);
            SpeakpadError::Speech(format!("Failed to start PowerShell: {}", e))
        })?;

    let writer = match (child.stdin.take(), input) {
        (Some(mut stdin), Some(input)) => {
            Some(thread::spawn(move || stdin.write_all(input.as_bytes())))
        }
        _ => None,
    };

    let output = child.wait_with_output()?;
    if let Some(writer) = writer {
        if let Ok(Err(e)) = writer.join() {
            debug!("PowerShell closed stdin early: {}", e);
        }
    }
    Ok(output)
}

/// Windows SAPI synthesis engine
pub struct SapiEngine {
    /// Path to powershell.exe
    powershell_path: String,
}

impl SapiEngine {
    /// Create a new Windows SAPI engine
    ///
    /// Verifies PowerShell is reachable and System.Speech loads.
    pub fn new() -> Result<Self> {
        debug!("Creating Windows SAPI backend");

        let powershell_path = find_powershell()?;
        debug!("Found PowerShell at: {}", powershell_path);

        Self::test_sapi(&powershell_path)?;
        Ok(Self { powershell_path })
    }

    pub fn powershell_path(&self) -> &str {
        &self.powershell_path
    }

    /// Test that Windows SAPI is available
    fn test_sapi(powershell_path: &str) -> Result<()> {
        let output = run_script(powershell_path, "Add-Type -AssemblyName System.Speech", None)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeakpadError::Speech(format!(
                "Windows SAPI not available: {}",
                stderr.trim()
            )));
        }

        debug!("Windows SAPI test successful");
        Ok(())
    }

    /// Build the stdin payload: voice line, then text
    fn request(text: &str, voice: Option<&str>) -> String {
        let voice = voice.unwrap_or("").replace(['\n', '\r'], "");
        format!("{}\n{}", voice, text)
    }

    /// Decode the script's reply: `pcm:` or `wav:` followed by base64
    ///
    /// System.Speech renders straight into the fixed format. OneCore voices
    /// come back as a WAV at the voice's own rate and are converted here.
    fn decode_stream(stdout: &[u8]) -> Result<Vec<u8>> {
        let reply = String::from_utf8_lossy(stdout);
        let (kind, encoded) = reply.trim().split_once(':').ok_or_else(|| {
            SpeakpadError::SynthesisFailed("SAPI returned no audio".to_string())
        })?;

        let bytes = BASE64.decode(encoded).map_err(|e| {
            SpeakpadError::SynthesisFailed(format!("SAPI returned malformed audio: {}", e))
        })?;

        match kind {
            "pcm" => Ok(bytes),
            "wav" => wav_to_pcm(&bytes),
            other => Err(SpeakpadError::SynthesisFailed(format!(
                "SAPI returned unknown audio kind '{}'",
                other
            ))),
        }
    }
}

impl SynthesisEngine for SapiEngine {
    fn name(&self) -> &'static str {
        "sapi"
    }

    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Box<dyn EngineOutput>> {
        debug!("SAPI synthesizing {} chars (voice: {:?})", text.len(), voice);
        let output = run_script(
            &self.powershell_path,
            SYNTH_SCRIPT,
            Some(Self::request(text, voice)),
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeakpadError::SynthesisFailed(format!(
                "SAPI exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pcm = Self::decode_stream(&output.stdout)?;
        debug!("SAPI produced {} bytes of PCM", pcm.len());
        Ok(OwnedOutput::new(pcm))
    }
}

#[derive(Debug, Deserialize)]
struct RegistryToken {
    id: String,
    name: Option<String>,
    kind: String,
}

/// Voice tokens from the Windows speech registries
pub struct RegistryVoices {
    powershell_path: String,
}

impl RegistryVoices {
    pub fn new(powershell_path: &str) -> Self {
        Self {
            powershell_path: powershell_path.to_string(),
        }
    }

    fn parse_tokens(json: &str) -> Result<Vec<VoiceEntry>> {
        let json = json.trim();
        if json.is_empty() {
            return Ok(Vec::new());
        }

        let tokens: Vec<RegistryToken> = serde_json::from_str(json)?;
        let voices = tokens
            .into_iter()
            .map(|token| {
                let provenance = if token.kind == "legacy" {
                    Provenance::LegacyCompatible
                } else {
                    Provenance::Standard
                };
                let name = token
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| token.id.clone());
                VoiceEntry::new(token.id, name, provenance)
            })
            .collect();

        Ok(order_by_provenance(voices))
    }
}

impl VoiceDirectory for RegistryVoices {
    fn list_voices(&self) -> Result<Vec<VoiceEntry>> {
        let output = run_script(&self.powershell_path, VOICES_SCRIPT, None)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeakpadError::Speech(format!(
                "Failed to read voice registry: {}",
                stderr.trim()
            )));
        }

        let voices = Self::parse_tokens(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Registry lists {} voices", voices.len());
        Ok(voices)
    }
}
