//! Prompt handling for the TUI.
//!
//! The bottom line doubles as a prompt: `/` opens a slash command, `s`
//! opens a catalog search.


/// What the prompt is collecting, if anything.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum InputMode {
    /// Keyboard shortcuts active.
    #[default]
    Normal,

    /// Typing a slash command.
    Command,

    /// Typing a catalog search query.
    Search,
}


impl InputMode {
    /// Text shown before the typed content.
    pub fn prefix( &self ) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::Command => "/",
            InputMode::Search => "Search: ",
        }
    }
}


/// Single-line edit buffer with a byte cursor kept on char boundaries.
#[derive( Debug, Default )]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}


impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn insert( &mut self, c: char ) {
        self.content.insert( self.cursor, c );
        self.cursor += c.len_utf8();
    }


    /// Deletes the character before the cursor.
    pub fn backspace( &mut self ) {
        if let Some( prev ) = self.prev_boundary() {
            self.content.remove( prev );
            self.cursor = prev;
        }
    }


    /// Deletes the character under the cursor.
    pub fn delete( &mut self ) {
        if self.cursor < self.content.len() {
            self.content.remove( self.cursor );
        }
    }


    pub fn clear( &mut self ) {
        self.content.clear();
        self.cursor = 0;
    }


    /// Returns the content and empties the buffer.
    pub fn take( &mut self ) -> String {
        self.cursor = 0;
        std::mem::take( &mut self.content )
    }


    pub fn content( &self ) -> &str {
        &self.content
    }


    /// Cursor position in characters, for display.
    pub fn cursor_char_pos( &self ) -> usize {
        self.content[ ..self.cursor ].chars().count()
    }


    pub fn move_left( &mut self ) {
        if let Some( prev ) = self.prev_boundary() {
            self.cursor = prev;
        }
    }


    pub fn move_right( &mut self ) {
        if let Some( c ) = self.content[ self.cursor.. ].chars().next() {
            self.cursor += c.len_utf8();
        }
    }


    pub fn move_home( &mut self ) {
        self.cursor = 0;
    }


    pub fn move_end( &mut self ) {
        self.cursor = self.content.len();
    }


    pub fn is_empty( &self ) -> bool {
        self.content.is_empty()
    }


    fn prev_boundary( &self ) -> Option<usize> {
        self.content[ ..self.cursor ].char_indices().last().map( |( i, _ )| i )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_edit_multibyte() {
        let mut buf = InputBuffer::new();
        for c in "Röya".chars() {
            buf.insert( c );
        }
        buf.move_left();
        buf.move_left();
        assert_eq!( buf.cursor_char_pos(), 2 );

        buf.backspace();
        assert_eq!( buf.content(), "Rya" );
        buf.move_right();
        buf.insert( '!' );
        assert_eq!( buf.content(), "Ry!a" );
    }


    #[test]
    fn test_take_empties() {
        let mut buf = InputBuffer::new();
        buf.insert( 'x' );
        assert_eq!( buf.take(), "x" );
        assert!( buf.is_empty() );
        assert_eq!( buf.cursor_char_pos(), 0 );
    }
}
